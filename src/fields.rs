//! Declarative catalog of the search-parameter form fields.
//!
//! Every form control is described here once: its wire name (the query
//! parameter it produces), its display label, and its kind. The rest of the
//! application dispatches on this table instead of matching on field-name
//! strings.

/// Upper bound for the two count fields (`start`, `num`).
pub const COUNT_MAX: u32 = 100;

/// Count inputs accept at most three characters.
pub const COUNT_MAX_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Start,
    ExactPhrase,
    FileType,
    LanguageRestrict,
    InterfaceLanguage,
    ResultCount,
    SiteSearch,
    ExcludedTerm,
    CountryRestrict,
    DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, passed through verbatim.
    Text,
    /// Digits only, at most [`COUNT_MAX_LEN`] characters, clamped to [`COUNT_MAX`].
    Count,
    /// One option from a fixed list; the first option is the default.
    Select(&'static SelectSpec),
}

/// A fixed option list for a selector field.
#[derive(Debug, PartialEq, Eq)]
pub struct SelectSpec {
    pub options: &'static [SelectOption],
}

#[derive(Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub label: &'static str,
    /// The literal query value. Empty for the default "any" option, which
    /// produces no tile.
    pub value: &'static str,
}

impl SelectSpec {
    pub fn default_option(&self) -> &'static SelectOption {
        &self.options[0]
    }

    /// Index of the option carrying `value`, if any.
    pub fn position_of(&self, value: &str) -> Option<usize> {
        self.options.iter().position(|opt| opt.value == value)
    }
}

static LR_SPEC: SelectSpec = SelectSpec {
    options: &[
        SelectOption { label: "Any language", value: "" },
        SelectOption { label: "English", value: "lang_en" },
        SelectOption { label: "German", value: "lang_de" },
        SelectOption { label: "French", value: "lang_fr" },
        SelectOption { label: "Spanish", value: "lang_es" },
        SelectOption { label: "Italian", value: "lang_it" },
        SelectOption { label: "Dutch", value: "lang_nl" },
        SelectOption { label: "Polish", value: "lang_pl" },
        SelectOption { label: "Portuguese", value: "lang_pt" },
        SelectOption { label: "Russian", value: "lang_ru" },
        SelectOption { label: "Ukrainian", value: "lang_uk" },
        SelectOption { label: "Japanese", value: "lang_ja" },
        SelectOption { label: "Chinese (Simplified)", value: "lang_zh-CN" },
    ],
};

static HL_SPEC: SelectSpec = SelectSpec {
    options: &[
        SelectOption { label: "Default interface", value: "" },
        SelectOption { label: "English", value: "en" },
        SelectOption { label: "German", value: "de" },
        SelectOption { label: "French", value: "fr" },
        SelectOption { label: "Spanish", value: "es" },
        SelectOption { label: "Italian", value: "it" },
        SelectOption { label: "Polish", value: "pl" },
        SelectOption { label: "Portuguese", value: "pt" },
        SelectOption { label: "Russian", value: "ru" },
        SelectOption { label: "Ukrainian", value: "uk" },
        SelectOption { label: "Japanese", value: "ja" },
    ],
};

static CR_SPEC: SelectSpec = SelectSpec {
    options: &[
        SelectOption { label: "Any region", value: "" },
        SelectOption { label: "United States", value: "countryUS" },
        SelectOption { label: "United Kingdom", value: "countryGB" },
        SelectOption { label: "Germany", value: "countryDE" },
        SelectOption { label: "France", value: "countryFR" },
        SelectOption { label: "Spain", value: "countryES" },
        SelectOption { label: "Italy", value: "countryIT" },
        SelectOption { label: "Netherlands", value: "countryNL" },
        SelectOption { label: "Poland", value: "countryPL" },
        SelectOption { label: "Ukraine", value: "countryUA" },
        SelectOption { label: "Canada", value: "countryCA" },
        SelectOption { label: "Australia", value: "countryAU" },
        SelectOption { label: "Japan", value: "countryJP" },
    ],
};

static TBS_SPEC: SelectSpec = SelectSpec {
    options: &[
        SelectOption { label: "Any time", value: "" },
        SelectOption { label: "Past hour", value: "qdr:h" },
        SelectOption { label: "Past 24 hours", value: "qdr:d" },
        SelectOption { label: "Past week", value: "qdr:w" },
        SelectOption { label: "Past month", value: "qdr:m" },
        SelectOption { label: "Past year", value: "qdr:y" },
    ],
};

impl FieldId {
    /// Every field in form order. Tile order follows this enumeration.
    pub const ALL: [FieldId; 10] = [
        FieldId::Start,
        FieldId::ExactPhrase,
        FieldId::FileType,
        FieldId::LanguageRestrict,
        FieldId::InterfaceLanguage,
        FieldId::ResultCount,
        FieldId::SiteSearch,
        FieldId::ExcludedTerm,
        FieldId::CountryRestrict,
        FieldId::DateRange,
    ];

    /// The query parameter name this field contributes.
    pub fn name(self) -> &'static str {
        match self {
            FieldId::Start => "start",
            FieldId::ExactPhrase => "as_epq",
            FieldId::FileType => "as_filetype",
            FieldId::LanguageRestrict => "lr",
            FieldId::InterfaceLanguage => "hl",
            FieldId::ResultCount => "num",
            FieldId::SiteSearch => "as_sitesearch",
            FieldId::ExcludedTerm => "as_eq",
            FieldId::CountryRestrict => "cr",
            FieldId::DateRange => "tbs",
        }
    }

    /// Display label, shown next to the control and on the tile chip.
    pub fn label(self) -> &'static str {
        match self {
            FieldId::Start => "Results offset",
            FieldId::ExactPhrase => "Exact phrase",
            FieldId::FileType => "File type",
            FieldId::LanguageRestrict => "Result language",
            FieldId::InterfaceLanguage => "Interface language",
            FieldId::ResultCount => "Results per page",
            FieldId::SiteSearch => "Site or domain",
            FieldId::ExcludedTerm => "Excluded term",
            FieldId::CountryRestrict => "Region",
            FieldId::DateRange => "Time range",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FieldId::Start | FieldId::ResultCount => FieldKind::Count,
            FieldId::ExactPhrase
            | FieldId::FileType
            | FieldId::SiteSearch
            | FieldId::ExcludedTerm => FieldKind::Text,
            FieldId::LanguageRestrict => FieldKind::Select(&LR_SPEC),
            FieldId::InterfaceLanguage => FieldKind::Select(&HL_SPEC),
            FieldId::CountryRestrict => FieldKind::Select(&CR_SPEC),
            FieldId::DateRange => FieldKind::Select(&TBS_SPEC),
        }
    }

    pub fn select_spec(self) -> Option<&'static SelectSpec> {
        match self.kind() {
            FieldKind::Select(spec) => Some(spec),
            _ => None,
        }
    }

    /// Hint shown in an empty control.
    pub fn placeholder(self) -> &'static str {
        match self {
            FieldId::Start => "10",
            FieldId::ExactPhrase => "exact words",
            FieldId::FileType => "pdf",
            FieldId::ResultCount => "20",
            FieldId::SiteSearch => "example.com",
            FieldId::ExcludedTerm => "word to leave out",
            _ => "",
        }
    }

    /// Look a field up by its wire name. Returns `None` for keys that no
    /// longer match any control, e.g. tiles persisted by an older version.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

/// Sanitize a count field after a keystroke: keep digits only, cap the
/// length, and replace anything above [`COUNT_MAX`] with the maximum.
pub fn sanitize_count(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.truncate(COUNT_MAX_LEN);
    match digits.parse::<u32>() {
        Ok(n) if n > COUNT_MAX => COUNT_MAX.to_string(),
        _ => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_count_strips_and_clamps() {
        // Digits survive, letters do not, length caps at three before clamping
        assert_eq!(sanitize_count("1234abc"), "100");
        assert_eq!(sanitize_count("123"), "100");
        assert_eq!(sanitize_count("45"), "45");
        assert_eq!(sanitize_count("100"), "100");
        assert_eq!(sanitize_count("abc"), "");
        assert_eq!(sanitize_count(""), "");
        // Leading zeros are kept as long as the numeric value is in range
        assert_eq!(sanitize_count("007"), "007");
    }

    #[test]
    fn test_field_order_matches_form() {
        let names: Vec<&str> = FieldId::ALL.iter().map(|id| id.name()).collect();
        assert_eq!(
            names,
            [
                "start",
                "as_epq",
                "as_filetype",
                "lr",
                "hl",
                "num",
                "as_sitesearch",
                "as_eq",
                "cr",
                "tbs"
            ]
        );
    }

    #[test]
    fn test_from_name_round_trips() {
        for id in FieldId::ALL {
            assert_eq!(FieldId::from_name(id.name()), Some(id));
        }
        assert_eq!(FieldId::from_name("as_oq"), None);
    }

    #[test]
    fn test_selectors_default_to_empty_value() {
        for id in FieldId::ALL {
            if let Some(spec) = id.select_spec() {
                assert_eq!(spec.default_option().value, "");
                assert!(spec.options.len() > 1, "{} has no real options", id.name());
            }
        }
    }

    #[test]
    fn test_position_of_finds_options() {
        let spec = FieldId::DateRange.select_spec().unwrap();
        assert_eq!(spec.position_of("qdr:w"), Some(3));
        assert_eq!(spec.position_of("qdr:x"), None);
    }
}
