use once_cell::sync::Lazy;
use regex::Regex;

// Block-level noise removed wholesale. `(?s)` so the body may span lines.
static HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<head[^>]*>.*?</head>").expect("valid head regex"));
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid script regex"));
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid style regex"));
static NOSCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<noscript[^>]*>.*?</noscript>").expect("valid noscript regex"));
static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static META_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<meta[^>]*/?>").expect("valid meta regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<link[^>]*/?>").expect("valid link regex"));

// Attributes that change between renders without changing meaning.
static PLAIN_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+(?:style|class|id|role|tabindex|crossorigin|rel|target)="[^"]*""#)
        .expect("valid attribute regex")
});
static DATA_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+data-[a-z0-9-]+="[^"]*""#).expect("valid data attribute regex")
});
static ARIA_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+aria-[a-z-]+="[^"]*""#).expect("valid aria attribute regex")
});
static EVENT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+="[^"]*""#).expect("valid event handler regex")
});

// Dynamic content that survives attribute stripping. Replacement order
// matters: full ISO timestamps first, then bare dates and times.
static ISO_TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z?").expect("valid timestamp regex")
});
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}[./]\d{1,2}[./]\d{2,4}").expect("valid date regex"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}:\d{2}(:\d{2})?").expect("valid time regex"));
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("valid uuid regex")
});
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9]{32,}\b").expect("valid token regex"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Strip noise from raw HTML so two renders of the same content compare
/// equal: head/script/style/noscript blocks, comments, meta/link tags,
/// presentation attributes, and volatile values (timestamps, dates,
/// times, UUIDs, session tokens) replaced by fixed placeholders.
///
/// Pure and idempotent; empty input yields empty output.
pub fn normalize_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut out = html.to_string();
    for re in [
        &*HEAD_RE,
        &*SCRIPT_RE,
        &*STYLE_RE,
        &*NOSCRIPT_RE,
        &*COMMENT_RE,
        &*META_RE,
        &*LINK_RE,
        &*PLAIN_ATTR_RE,
        &*DATA_ATTR_RE,
        &*ARIA_ATTR_RE,
        &*EVENT_ATTR_RE,
    ] {
        out = re.replace_all(&out, "").into_owned();
    }

    out = ISO_TIMESTAMP_RE.replace_all(&out, "TIMESTAMP").into_owned();
    out = DATE_RE.replace_all(&out, "DATE").into_owned();
    out = TIME_RE.replace_all(&out, "TIME").into_owned();
    out = UUID_RE.replace_all(&out, "UUID").into_owned();
    out = TOKEN_RE.replace_all(&out, "TOKEN").into_owned();

    out = WHITESPACE_RE.replace_all(&out, " ").into_owned();
    out.trim().to_string()
}
