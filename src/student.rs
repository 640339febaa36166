use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub name: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("please enter your name")]
    MissingName,
    #[error("please select your grade")]
    MissingGrade,
    #[error("unknown grade {0:?}")]
    UnknownGrade(String),
}

impl LoginError {
    pub fn code(&self) -> &'static str {
        match self {
            LoginError::MissingName => "invalid_name",
            LoginError::MissingGrade | LoginError::UnknownGrade(_) => "invalid_grade",
        }
    }
}

/// Grade matching ignores case and surrounding whitespace; the configured
/// spelling is kept.
pub fn login(name: &str, grade: &str, grades: &[String]) -> Result<Student, LoginError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LoginError::MissingName);
    }
    let grade = grade.trim();
    if grade.is_empty() {
        return Err(LoginError::MissingGrade);
    }
    let Some(known) = grades.iter().find(|g| g.eq_ignore_ascii_case(grade)) else {
        return Err(LoginError::UnknownGrade(grade.to_string()));
    };
    Ok(Student {
        name: name.to_string(),
        grade: known.clone(),
    })
}
