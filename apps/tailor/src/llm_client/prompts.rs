// Cross-cutting prompt fragments shared by every generation call.
// Task-specific prompts live in generation/prompts.rs.

/// System prompt sent with every request.
pub const CAREER_COACH_SYSTEM: &str = "You are a professional career coach and \
    resume-writing assistant. Your task is to craft strong, impactful, and \
    industry-relevant resume bullet points that make the candidate's profile stand \
    out for data analytics, data engineering and other analyst roles.";

/// Appended to every prompt whose answer is parsed as YAML.
pub const YAML_ONLY_INSTRUCTION: &str = "\
    Respond with valid YAML only. NO PREAMBLE, no explanations, \
    and no markdown code fences.";
