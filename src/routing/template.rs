//! Path template compilation and parameter substitution.

use thiserror::Error;

/// Errors raised while compiling a path template or substituting captured
/// parameters into it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The template does not start with `/`.
    #[error("path template '{0}' does not start with '/'")]
    MissingLeadingSlash(String),

    /// A `{` was never closed.
    #[error("unclosed '{{' in path template '{0}'")]
    UnclosedBrace(String),

    /// A `}` appeared without a matching `{`.
    #[error("unmatched '}}' in path template '{0}'")]
    UnmatchedBrace(String),

    /// A parameter placeholder with an empty or unusable name.
    #[error("invalid parameter name '{name}' in path template '{template}'")]
    InvalidParameter { template: String, name: String },

    /// A captured parameter required by the template was not provided.
    #[error("no captured value for path parameter '{0}'")]
    MissingParameter(String),
}

/// One piece of a compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, copied into the outbound path unchanged.
    Literal(String),

    /// A `{name}` placeholder, replaced with the captured value.
    Parameter(String),
}

/// A compiled path template.
///
/// The raw template string is retained verbatim for route registration
/// (OpenAPI's `{name}` placeholder syntax is also axum's capture syntax);
/// the segment list drives substitution.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template, validating its placeholder syntax.
    pub fn compile(raw: &str) -> Result<Self, RouteError> {
        if !raw.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(raw.to_string()));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(RouteError::UnclosedBrace(raw.to_string())),
                            Some(c) => name.push(c),
                            None => return Err(RouteError::UnclosedBrace(raw.to_string())),
                        }
                    }
                    if name.is_empty() || name.contains(['/', '*', ':']) {
                        return Err(RouteError::InvalidParameter {
                            template: raw.to_string(),
                            name,
                        });
                    }
                    segments.push(Segment::Parameter(name));
                }
                '}' => return Err(RouteError::UnmatchedBrace(raw.to_string())),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template exactly as it appeared in the schema.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the template declares at least one parameter.
    pub fn has_parameters(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Parameter(_)))
    }

    /// Build the concrete outbound path by replacing each placeholder with
    /// its captured value. Values are used exactly as matched; no encoding
    /// or decoding is applied.
    pub fn substitute(&self, captured: &[(String, String)]) -> Result<String, RouteError> {
        let mut path = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Parameter(name) => {
                    let value = captured
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| value.as_str())
                        .ok_or_else(|| RouteError::MissingParameter(name.clone()))?;
                    path.push_str(value);
                }
            }
        }
        Ok(path)
    }
}
