//!A mod for the error types
use std::fmt::Debug;

///Common error type when configuring or starting a board.
pub enum WabcError {
    Message(String),
    Messages(Vec<String>),
}

impl WabcError {
    pub fn from_string(msg: String) -> Self {
        WabcError::Message(msg)
    }
    pub fn from_errs(errs: Vec<WabcError>) -> Self {
        let mut messages = Vec::with_capacity(errs.len());
        for err in errs {
            match err {
                Self::Message(msg) => messages.push(msg),
                Self::Messages(mut msgs) => messages.append(&mut msgs),
            }
        }
        Self::Messages(messages)
    }
}

impl Debug for WabcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => f.write_fmt(format_args!("WabcError: {}", message)),
            Self::Messages(messages) => f.write_fmt(format_args!(
                "WabcError (multiple): \n{}",
                messages.join("\n")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WabcError;

    #[test]
    fn test_from_errs_flattens_messages() {
        let err = WabcError::from_errs(vec![
            WabcError::from_string("first".to_owned()),
            WabcError::Messages(vec!["second".to_owned(), "third".to_owned()]),
        ]);
        match err {
            WabcError::Messages(msgs) => assert_eq!(msgs, vec!["first", "second", "third"]),
            WabcError::Message(_) => panic!("expected multiple messages"),
        }
    }

    #[test]
    fn test_debug_format() {
        let err = WabcError::from_string("no bus".to_owned());
        assert_eq!(format!("{:?}", err), "WabcError: no bus");
    }
}
