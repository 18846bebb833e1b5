//! Verb, Schema, and Status enumerations (spec.md §3), plus the header map.
//!
//! Grounded on `myhttp/enums.hpp`/`.cpp`: three closed enums with a
//! canonical-name lookup table, reimplemented with a declarative macro in
//! the teacher's `set_status_codes!` style rather than the original's
//! parallel `std::array` lookup tables.

/// HTTP request methods this server understands (spec.md §3: closed
/// enumeration). Any other method lexeme is accepted leniently as `Get`
/// (spec.md §4.3, "this is lenient — documented as a known limitation").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub(crate) fn parse(lexeme: &str) -> Self {
        match lexeme {
            "GET" => Verb::Get,
            "HEAD" => Verb::Head,
            "POST" => Verb::Post,
            "PUT" => Verb::Put,
            "DELETE" => Verb::Delete,
            _ => Verb::Get,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

/// HTTP protocol version (spec.md §3). Request-line parsing never
/// produces `Unknown` itself — an unrecognized lexeme defaults to
/// `Http11` (spec.md §4.3) — but the variant is kept so the closed
/// three-value enum from spec.md is representable end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    Http10,
    Http11,
    Unknown,
}

impl Schema {
    pub(crate) fn parse(lexeme: &str) -> Self {
        match lexeme {
            "HTTP/1.0" => Schema::Http10,
            "HTTP/1.1" => Schema::Http11,
            _ => Schema::Http11,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Schema::Http10 => "HTTP/1.0",
            Schema::Http11 => "HTTP/1.1",
            Schema::Unknown => "HTTP/1.1",
        }
    }
}

macro_rules! set_status_codes {
    ($( $name:ident = ($num:literal, $reason:literal); )+) => {
        /// HTTP status codes this server can emit (spec.md §3: closed
        /// enumeration). Each value carries a canonical code string and
        /// reason phrase.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Status { $( $name, )+ }

        impl Status {
            /// The three-digit status code, e.g. `"200"`.
            pub const fn code(self) -> &'static str {
                match self { $( Status::$name => stringify!($num), )+ }
            }

            /// The canonical reason phrase, e.g. `"OK"`.
            pub const fn reason(self) -> &'static str {
                match self { $( Status::$name => $reason, )+ }
            }
        }
    };
}

set_status_codes! {
    Ok = (200, "OK");
    NotModified = (304, "Not Modified");
    PermanentRedirect = (308, "Permanent Redirect");
    BadRequest = (400, "Bad Request");
    NotFound = (404, "Not Found");
    MethodNotAllowed = (405, "Method Not Allowed");
    NotAcceptable = (406, "Not Acceptable");
    LengthRequired = (411, "Length Required");
    PreconditionFailed = (412, "Precondition Failed");
    PayloadTooLarge = (413, "Payload Too Large");
    RequestHeaderFieldsTooLarge = (431, "Request Header Fields Too Large");
    InternalServerError = (500, "Internal Server Error");
    NotImplemented = (501, "Not Implemented");
}

/// A case-insensitive, insertion-ordered header map (spec.md §3: "a
/// case-insensitive-keyed header mapping with insertion-ordered
/// iteration"). Backed by a `Vec` rather than the original's `std::map`
/// (which sorts by key) — see DESIGN.md for this REDESIGN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub(crate) fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Inserts or overwrites a header, preserving the position of the
    /// first insertion if the name already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes every header except the given one, keeping that one's
    /// current value if present (used by the 304/412 rewrite in
    /// spec.md §4.7 step 5: "clear headers except `Last-Modified`").
    pub(crate) fn retain_only(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n.eq_ignore_ascii_case(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
