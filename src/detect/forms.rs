use once_cell::sync::Lazy;
use regex::Regex;

static FORM_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<form[^>]*>").expect("valid form tag regex"));
static INPUT_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<input[^>]*>").expect("valid input tag regex"));
static SUBMIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(?:button|input)[^>]*type=["']?submit["']?[^>]*>"#)
        .expect("valid submit control regex")
});
static NAME_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)name.*input|input.*name").expect("valid name field regex"));
static EMAIL_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)email.*input|input.*email").expect("valid email field regex"));
static ADDRESS_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)address|adresse").expect("valid address field regex"));
static PDF_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\.pdf["'\s>]"#).expect("valid pdf link regex"));
static PDF_FORM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(antrag|formular|application|form).*\.pdf").expect("valid pdf form regex")
});
static ONLINE_APPLICATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)online.*antrag|onlineantrag|apply.*online")
        .expect("valid online application regex")
});
static APPLICATION_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/antrag|/application|/bewerbung").expect("valid application path regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormType {
    None,
    Html,
    Pdf,
}

#[derive(Debug, Clone, Copy)]
pub struct FormDetection {
    pub detected: bool,
    pub form_type: FormType,
    pub confidence: f64,
}

impl FormDetection {
    fn none() -> Self {
        Self {
            detected: false,
            form_type: FormType::None,
            confidence: 0.0,
        }
    }

    pub fn description(&self) -> &'static str {
        match self.form_type {
            FormType::Pdf => "📄 PDF-Antragsformular gefunden! Download jetzt möglich.",
            _ => "📝 Online-Anmeldeformular entdeckt! Du kannst dich jetzt bewerben.",
        }
    }
}

/// Scan raw HTML for an application/registration form. Decision order
/// mirrors urgency: a submit-capable HTML form beats a PDF form beats a
/// bare online-application link. First match wins; results are not
/// cumulative across rules, and malformed HTML simply yields no match.
pub fn detect_forms(html: &str) -> FormDetection {
    let has_form = FORM_TAG_RE.is_match(html);
    let has_inputs = INPUT_TAG_RE.is_match(html);
    let has_submit = SUBMIT_RE.is_match(html);

    if has_form && has_inputs && has_submit {
        let has_personal_field = NAME_FIELD_RE.is_match(html)
            || EMAIL_FIELD_RE.is_match(html)
            || ADDRESS_FIELD_RE.is_match(html);
        return FormDetection {
            detected: true,
            form_type: FormType::Html,
            confidence: if has_personal_field { 0.95 } else { 0.7 },
        };
    }

    if PDF_LINK_RE.is_match(html) && PDF_FORM_RE.is_match(html) {
        return FormDetection {
            detected: true,
            form_type: FormType::Pdf,
            confidence: 0.85,
        };
    }

    if ONLINE_APPLICATION_RE.is_match(html) || APPLICATION_PATH_RE.is_match(html) {
        return FormDetection {
            detected: true,
            form_type: FormType::Html,
            confidence: 0.8,
        };
    }

    FormDetection::none()
}
