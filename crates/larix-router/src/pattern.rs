//! URL template compilation and path matching.
//!
//! A template like `/users/{id}/posts/{post}` compiles into a segment
//! list; `{identifier}` segments are placeholders, everything else is a
//! literal. Matching is anchored at both ends and performs no slash
//! normalization: the caller is responsible for trailing/leading slash
//! policy.

use memchr::memchr_iter;

/// One compiled template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Must match byte-for-byte.
    Literal(String),
    /// Matches one-or-more non-`/` bytes; carries the placeholder name.
    Param(String),
}

/// A compiled URL template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a template.
    ///
    /// A segment is a placeholder only when it is exactly `{identifier}`
    /// with `identifier` drawn from `[A-Za-z0-9_]+`; anything else
    /// (including braces embedded mid-segment) stays literal.
    #[must_use]
    pub fn compile(template: &str) -> Self {
        let segments = split_segments(template)
            .map(|segment| match placeholder_name(segment) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self {
            template: template.to_string(),
            segments,
        }
    }

    /// The original template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Declared placeholder names, in template order.
    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Match a concrete path against the template.
    ///
    /// Returns the substrings bound to each placeholder in template
    /// order, or `None` if the path does not satisfy the template. The
    /// match covers the entire path; segment counts must agree exactly.
    #[must_use]
    pub fn match_path<'p>(&self, path: &'p str) -> Option<Vec<&'p str>> {
        let mut bound = Vec::new();
        let mut path_segments = split_segments(path);

        for segment in &self.segments {
            let candidate = path_segments.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != candidate {
                        return None;
                    }
                }
                Segment::Param(_) => {
                    if candidate.is_empty() {
                        return None;
                    }
                    bound.push(candidate);
                }
            }
        }

        // Anchored at the end: the path must be fully consumed.
        if path_segments.next().is_some() {
            return None;
        }

        Some(bound)
    }
}

/// Split on every `/`, keeping empty segments.
///
/// `"/a//b"` yields `["", "a", "", "b"]`, so leading, doubled, and
/// trailing slashes all stay visible to the matcher.
fn split_segments(input: &str) -> impl Iterator<Item = &str> {
    let bytes = input.as_bytes();
    let mut start = 0;
    let mut slashes = memchr_iter(b'/', bytes);
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match slashes.next() {
            Some(end) => {
                let segment = &input[start..end];
                start = end + 1;
                Some(segment)
            }
            None => {
                done = true;
                Some(&input[start..])
            }
        }
    })
}

fn placeholder_name(segment: &str) -> Option<&str> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() {
        return None;
    }
    inner
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        .then_some(inner)
}
