use std::fmt::Write;

/// Cached operations, the first component of every cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Episode,
    EpisodeServer,
    Stream,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Episode => "episode",
            Operation::EpisodeServer => "episode-server",
            Operation::Stream => "stream",
        }
    }
}

/// Builds a cache key from an operation name and its ordered arguments.
///
/// Components are joined with `:`. Separators and backslashes inside a
/// component are escaped, so distinct argument lists never map to the same
/// key.
pub fn generate_key<I, S>(operation: &str, parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::with_capacity(operation.len() + 16);
    push_escaped(&mut key, operation);
    for part in parts {
        key.push(':');
        push_escaped(&mut key, part.as_ref());
    }
    key
}

fn push_escaped(out: &mut String, component: &str) {
    for c in component.chars() {
        if c == ':' || c == '\\' {
            out.push('\\');
        }
        // Writing to a String cannot fail.
        let _ = out.write_char(c);
    }
}
