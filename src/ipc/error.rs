use serde_json::{json, Value};

use crate::questions::SourceError;
use crate::quiz::QuizError;
use crate::student::LoginError;

pub fn ok(id: &str, result: Value) -> Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<QuizError> for HandlerErr {
    fn from(e: QuizError) -> Self {
        let details = match &e {
            QuizError::Incomplete { answered, total } => {
                Some(json!({ "answered": answered, "total": total }))
            }
            _ => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

impl From<SourceError> for HandlerErr {
    fn from(e: SourceError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<LoginError> for HandlerErr {
    fn from(e: LoginError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}
