use std::fmt;
use std::sync::Arc;

use super::request::ParamVec;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(Box<str>),
    Param(Arc<str>),
}

/// Compiled mount or route pattern such as `/stack`, `/{channel}` or `/:channel/router`.
///
/// Patterns are matched segment by segment, so `/alpha` never matches `/alphabet`.
/// Matching is case-sensitive.
#[derive(Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: Arc<str>,
    segments: Arc<[Segment]>,
}

/// Successful prefix match: captured params and the remaining path (always rooted)
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixMatch {
    pub params: ParamVec,
    pub rest: String,
}

impl PathPattern {
    /// Compile a pattern. `{name}` and `:name` segments capture a parameter.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        let segments: Vec<Segment> = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = s.strip_prefix(':') {
                    Segment::Param(Arc::from(name))
                } else if s.len() > 2 && s.starts_with('{') && s.ends_with('}') {
                    Segment::Param(Arc::from(&s[1..s.len() - 1]))
                } else {
                    Segment::Literal(Box::from(s))
                }
            })
            .collect();

        Self {
            raw: Arc::from(pattern),
            segments: segments.into(),
        }
    }

    /// The pattern as written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match the pattern against the start of `path`.
    ///
    /// The remainder keeps its leading `/`; an exhausted path becomes `/`.
    #[must_use]
    pub fn match_prefix(&self, path: &str) -> Option<PrefixMatch> {
        let (params, rest) = self.match_segments(path)?;
        let rest = if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        };
        Some(PrefixMatch { params, rest })
    }

    /// Match the whole of `path`, tolerating one trailing slash
    #[must_use]
    pub fn match_exact(&self, path: &str) -> Option<ParamVec> {
        let (params, rest) = self.match_segments(path)?;
        if rest.is_empty() || rest == "/" {
            Some(params)
        } else {
            None
        }
    }

    fn match_segments<'p>(&self, path: &'p str) -> Option<(ParamVec, &'p str)> {
        let mut rest = path;
        let mut params = ParamVec::new();

        for segment in self.segments.iter() {
            let trimmed = rest.strip_prefix('/')?;
            let end = trimmed.find('/').unwrap_or(trimmed.len());
            let (value, tail) = trimmed.split_at(end);
            if value.is_empty() {
                return None;
            }
            match segment {
                Segment::Literal(literal) => {
                    if value != literal.as_ref() {
                        return None;
                    }
                }
                Segment::Param(name) => params.push((Arc::clone(name), value.to_string())),
            }
            rest = tail;
        }

        Some((params, rest))
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.raw).finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
