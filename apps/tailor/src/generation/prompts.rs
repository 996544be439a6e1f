// All LLM prompt templates for the tailoring pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

/// First pass: rewrite experience, write the summary and skills.
/// Replace `{experience}`, `{company_count}`, `{job_description}`, `{yaml_instruction}`.
pub const EXPERIENCE_PROMPT_TEMPLATE: &str = r#"Instruction:
Generate an ATS-friendly resume tailored to the job description, using keywords from both the job description and my resume. The output must follow the structure provided.

---
Resume Generation Guidelines:

1. Work Experience:
   * Rewrite the bullet points using strong action verbs and quantifiable results (e.g., "Increased sales by 15%", "Reduced costs by $10K", "Managed a team of 5").
   * Ensure these points clearly demonstrate transferable skills.
   * Produce exactly {company_count} work_experience entries, one per company below, in the same order.

2. Professional Summary:
   * Write a powerful 1-line professional summary that highlights my most relevant skills and experience for this job and hooks a recruiter in under 10 seconds.

3. Skills:
   * List up to 6 key skill categories.
   * Under each category, provide up to 3 highly relevant keywords (avoiding repetition) that reflect terms from the job description and my resume.

---
Output Format:

summary: <1-line professional summary>
skills:
  - name: <Skill Category>
    keywords: [<keyword1>, <keyword2>, <keyword3>]
work_experience:
  - title: <Job Title>
    company: <Company Name>
    dates: <Start Date - End Date>
    achievements:
      - <Action Verb> + <What you did> + <Quantifiable Result>

---
My Resume:
Professional Experience:
{experience}

---
Job Description:
{job_description}

{yaml_instruction}
"#;

/// Second pass: invent projects covering keywords the tailored résumé still misses.
/// Replace `{resume}`, `{projects}`, `{job_description}`, `{yaml_instruction}`.
pub const PROJECTS_PROMPT_TEMPLATE: &str = r#"Projects:
Generate 2 ATS-friendly new projects covering mandatory keywords or technologies from the job description that are missing from my work experience and projects.

Project Generation Guidelines:
1. The project can be built from freely available online data by a college graduate.
2. The graduate can learn new technology from online tutorials.
3. Projects have an easy difficulty level.

---
Output Format:

projects:
  - project_name: <Project Title in 3 words>
    description: <Short idea in one line>
    keywords: [<keyword1>, <keyword2>, <keyword3>]

My Resume:
{resume}

---
Job Description:
{job_description}

---
My Existing Projects:
{projects}

{yaml_instruction}
"#;

/// Company/position extraction for the application archive.
/// Replace `{job_description}`, `{yaml_instruction}`.
pub const POSTING_PROMPT_TEMPLATE: &str = r#"What are the company name and the position name in the job description below? Use null for anything the text does not state.

{job_description}

Output Format:

company: <company name or null>
position: <position name or null>

{yaml_instruction}
"#;

/// Substitutes `{name}` placeholders in a single left-to-right pass.
///
/// Inserted values are never rescanned, so braces inside a job description or
/// a bullet survive verbatim. Unknown placeholders are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let substitution = values.iter().find_map(|(name, value)| {
            let placeholder_len = name.len() + 2;
            let matches = tail.len() >= placeholder_len
                && tail[1..].starts_with(name)
                && tail[1 + name.len()..].starts_with('}');
            matches.then_some((placeholder_len, *value))
        });
        match substitution {
            Some((len, value)) => {
                out.push_str(value);
                rest = &tail[len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
