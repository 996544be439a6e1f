//! LaTeX source for the one-page résumé.
//!
//! Sections in order: header, Summary, Skills, Work Experience, Projects, Education.
//! Every piece of document text goes through `escape` before it is embedded.

use crate::models::document::TailoredDocument;
use crate::models::resume::BaseResume;

const PREAMBLE: &str = r"\documentclass[10pt]{article}
\usepackage[a4paper,margin=0.55in]{geometry}
\usepackage[T1]{fontenc}
\usepackage[utf8]{inputenc}
\usepackage{helvet}
\renewcommand{\familydefault}{\sfdefault}
\usepackage{enumitem}
\usepackage{titlesec}
\usepackage[hidelinks]{hyperref}
\pagestyle{empty}
\setlength{\parindent}{0pt}
\setlist[itemize]{leftmargin=1.2em,itemsep=1pt,topsep=2pt,parsep=0pt}
\titleformat{\section}{\large\bfseries}{}{0em}{}[\titlerule]
\titlespacing*{\section}{0pt}{8pt}{4pt}
\begin{document}
";

/// Escapes LaTeX special characters in user or generated text.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the full document source.
pub fn render_source(base: &BaseResume, document: &TailoredDocument) -> String {
    let mut tex = String::from(PREAMBLE);

    if let Some(profile) = &base.profile {
        tex.push_str(&format!(
            "\\begin{{center}}{{\\LARGE\\bfseries {}}}\\\\[2pt]\n",
            escape(&profile.name)
        ));
        let contacts: Vec<String> = profile
            .email
            .iter()
            .chain(profile.phone.iter())
            .chain(profile.links.iter())
            .map(|c| escape(c))
            .collect();
        tex.push_str(&format!(
            "{}\n\\end{{center}}\n",
            contacts.join(r" \quad | \quad ")
        ));
    }

    tex.push_str("\\section*{Summary}\n");
    tex.push_str(&format!("{}\n\n", escape(&document.summary)));

    if !document.skills.is_empty() {
        tex.push_str("\\section*{Skills}\n");
        for group in &document.skills {
            tex.push_str(&format!(
                "\\textbf{{{}:}} {}\\\\\n",
                escape(&group.name),
                escape(&group.keywords.join(", "))
            ));
        }
    }

    tex.push_str("\\section*{Work Experience}\n");
    for entry in &document.work_experience {
        tex.push_str(&format!(
            "\\textbf{{{}}} \\hfill {}\\\\\n{}\n",
            escape(&entry.title),
            escape(&entry.dates),
            escape(&entry.company)
        ));
        write_items(&mut tex, &entry.achievements);
    }

    if !document.projects.is_empty() {
        tex.push_str("\\section*{Projects}\n");
        for project in &document.projects {
            if !project.project_name.trim().is_empty() {
                tex.push_str(&format!("\\textbf{{{}}}\\\\\n", escape(&project.project_name)));
            }
            tex.push_str(&escape(&project.description));
            if !project.keywords.is_empty() {
                tex.push_str(&format!(
                    " \\textit{{({})}}",
                    escape(&project.keywords.join(", "))
                ));
            }
            tex.push_str("\\\\[4pt]\n");
        }
    }

    if !base.education.is_empty() {
        tex.push_str("\\section*{Education}\n");
        for edu in &base.education {
            tex.push_str(&format!("\\textbf{{{}}}", escape(&edu.degree)));
            if let Some(gpa) = &edu.gpa {
                tex.push_str(&format!(" \\hfill GPA: {} / 4.0", escape(gpa)));
            }
            tex.push_str(&format!("\\\\\n{}", escape(&edu.institution)));
            if let Some(dates) = &edu.dates {
                tex.push_str(&format!(" \\hfill {}", escape(dates)));
            }
            tex.push_str("\\\\[4pt]\n");
        }
    }

    tex.push_str("\\end{document}\n");
    tex
}

fn write_items(tex: &mut String, items: &[String]) {
    if items.is_empty() {
        tex.push_str("\\\\[4pt]\n");
        return;
    }
    tex.push_str("\\begin{itemize}\n");
    for item in items {
        tex.push_str(&format!("  \\item {}\n", escape(item)));
    }
    tex.push_str("\\end{itemize}\n");
}
