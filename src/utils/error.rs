// src/utils/error.rs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0}")]
    Msg(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(serde::Serialize)]
#[serde(tag = "kind", content = "message")]
#[serde(rename_all = "camelCase")]
enum ErrorKind {
    Io(String),
    Json(String),
    Yaml(String),
    Msg(String),
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let error_message = self.to_string();
        let error_kind = match self {
            Self::Io(_) => ErrorKind::Io(error_message),
            Self::Json(_) => ErrorKind::Json(error_message),
            Self::Yaml(_) => ErrorKind::Yaml(error_message),
            Self::Msg(_) => ErrorKind::Msg(error_message),
        };
        error_kind.serialize(serializer)
    }
}

#[macro_export]
macro_rules! err {
    ($msg:literal $(,)?) => {
        $crate::utils::error::Error::Msg($msg.to_string())
    };
    ($err_expr:expr $(,)?) => {
        $crate::utils::error::Error::Msg($err_expr.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::utils::error::Error::Msg(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_kind_and_message() {
        let e = err!("unsupported registry file '{}'", "settings.toml");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "msg");
        assert_eq!(json["message"], "unsupported registry file 'settings.toml'");
    }

    #[test]
    fn io_errors_keep_their_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: Error = io.into();
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "io");
        assert_eq!(json["message"], "missing");
    }
}
