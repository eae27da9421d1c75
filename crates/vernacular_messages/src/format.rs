//! Positional message templates.
//!
//! Templates reference arguments by position, `{0}`, `{1}`, and may carry a
//! format hint after a comma (`{0,number}`), which is accepted and ignored:
//! arguments are rendered with their `Display` implementation.
//!
//! Single quotes escape literal text: `'{'` renders a brace, `''` renders one
//! quote, and `'{0}'` renders the placeholder text verbatim. An unterminated
//! quote runs to the end of the template.

/// Errors detected while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// A `{` without matching `}`, or a `}` without matching `{`.
    #[error("unbalanced braces at byte {0}")]
    Unbalanced(usize),

    /// A placeholder whose index is not a non-negative integer.
    #[error("invalid argument index '{0}'")]
    InvalidIndex(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Argument(usize),
}

/// A parsed positional template.
///
/// # Example
///
/// ```
/// use vernacular_messages::MessageFormat;
///
/// let format = MessageFormat::parse("Hello {0}, you have {1} new messages")?;
/// assert_eq!(format.format(&[&"Ada", &3]), "Hello Ada, you have 3 new messages");
///
/// // Arguments that are not supplied are left in place.
/// assert_eq!(format.format(&[&"Ada"]), "Hello Ada, you have {1} new messages");
/// # Ok::<(), vernacular_messages::FormatError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFormat {
    segments: Vec<Segment>,
}

impl MessageFormat {
    /// Parses `template`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] for unbalanced braces or a non-numeric index.
    pub fn parse(template: &str) -> Result<Self, FormatError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = template.char_indices().peekable();
        let mut quoted = false;

        while let Some((at, c)) = chars.next() {
            match c {
                '\'' => {
                    if chars.peek().is_some_and(|&(_, next)| next == '\'') {
                        chars.next();
                        text.push('\'');
                    } else {
                        quoted = !quoted;
                    }
                }
                _ if quoted => text.push(c),
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(FormatError::Unbalanced(at)),
                            c => body.push(c),
                        }
                    }
                    if !closed {
                        return Err(FormatError::Unbalanced(at));
                    }

                    let index = body.split(',').next().unwrap_or_default().trim();
                    let index = index
                        .parse::<usize>()
                        .map_err(|_| FormatError::InvalidIndex(body.clone()))?;
                    if !text.is_empty() {
                        segments.push(Segment::Text(core::mem::take(&mut text)));
                    }
                    segments.push(Segment::Argument(index));
                }
                '}' => return Err(FormatError::Unbalanced(at)),
                c => text.push(c),
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(Self { segments })
    }

    /// Renders the template with `args`.
    #[must_use]
    pub fn format(&self, args: &[&dyn core::fmt::Display]) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Argument(index) => match args.get(*index) {
                    Some(arg) => out.push_str(&arg.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(&index.to_string());
                        out.push('}');
                    }
                },
            }
        }
        out
    }

    /// Returns the highest argument index referenced, if any.
    #[must_use]
    pub fn max_index(&self) -> Option<usize> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Argument(index) => Some(*index),
                Segment::Text(_) => None,
            })
            .max()
    }
}

/// Formats `template` with `args`, returning the template unchanged when it
/// cannot be parsed.
#[must_use]
pub fn format_or_raw(template: &str, args: &[&dyn core::fmt::Display]) -> String {
    match MessageFormat::parse(template) {
        Ok(format) => format.format(args),
        Err(error) => {
            tracing::debug!(template, %error, "malformed message template, using it verbatim");
            template.to_string()
        }
    }
}
