// Shared prompt fragments. Stage-specific prompts live in planning::prompts.

/// System instruction that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are an expert travel planner. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every stage prompt that names real places.
pub const PLACE_ID_INSTRUCTION: &str = "\
    For each hotel, restaurant and activity location, include its Google Maps Place ID \
    (e.g. ChIJ...) in a `placeId` field if you know it, or the exact string \
    'ID not available' if you do not. Never invent a Place ID.";

/// Appended to every stage prompt that carries costs.
pub const COST_INSTRUCTION: &str = "\
    All costs are plain numbers in the traveller's budget currency, without currency \
    symbols, thousands separators or ranges.";
