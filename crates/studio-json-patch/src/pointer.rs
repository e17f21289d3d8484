use serde_json::Value;
use studio_error::StudioError;

/// A parsed RFC 6901 JSON Pointer: the sequence of reference tokens between
/// the leading `/`s, with `~1` and `~0` escapes already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer(Vec<String>);

impl Pointer {
    /// Parse a pointer string. The empty string denotes the whole document.
    pub fn parse(raw: &str) -> Result<Self, StudioError> {
        if raw.is_empty() {
            return Ok(Self(Vec::new()));
        }
        if !raw.starts_with('/') {
            return Err(StudioError::validation(format!(
                "invalid JSON pointer {raw:?}: must start with '/'"
            )));
        }
        let tokens = raw[1..]
            .split('/')
            .map(unescape_token)
            .collect::<Vec<_>>();
        Ok(Self(tokens))
    }

    /// `true` if this pointer addresses the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// All tokens but the last — the path to the parent container.
    #[must_use]
    pub fn parent_tokens(&self) -> &[String] {
        if self.0.is_empty() {
            &[]
        } else {
            &self.0[..self.0.len() - 1]
        }
    }

    /// The last token, the key/index within the parent container.
    #[must_use]
    pub fn last_token(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// All tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

fn unescape_token(tok: &str) -> String {
    tok.replace("~1", "/").replace("~0", "~")
}

/// Resolve `pointer` against `root`, returning a reference to the addressed
/// value. Fails if any intermediate segment does not exist or is not a
/// container.
pub fn resolve<'a>(root: &'a Value, pointer: &Pointer) -> Result<&'a Value, StudioError> {
    let mut current = root;
    for token in pointer.tokens() {
        current = step(current, token)?;
    }
    Ok(current)
}

fn step<'a>(current: &'a Value, token: &str) -> Result<&'a Value, StudioError> {
    match current {
        Value::Object(map) => map
            .get(token)
            .ok_or_else(|| StudioError::validation(format!("path segment {token:?} not found"))),
        Value::Array(arr) => {
            if token == "-" {
                return Err(StudioError::validation(
                    "'-' cannot be resolved for reading, only for append",
                ));
            }
            let idx = parse_index(token, arr.len())?;
            arr.get(idx)
                .ok_or_else(|| StudioError::validation(format!("array index {idx} out of bounds")))
        }
        _ => Err(StudioError::validation(format!(
            "cannot descend into a scalar value with segment {token:?}"
        ))),
    }
}

/// Parse an array index token, rejecting leading zeros (other than `"0"`
/// itself) and out-of-range values per RFC 6901.
pub fn parse_index(token: &str, len: usize) -> Result<usize, StudioError> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return Err(StudioError::validation(format!(
            "invalid array index {token:?}"
        )));
    }
    let idx: usize = token
        .parse()
        .map_err(|_| StudioError::validation(format!("invalid array index {token:?}")))?;
    if idx > len {
        return Err(StudioError::validation(format!(
            "array index {idx} out of bounds"
        )));
    }
    Ok(idx)
}
