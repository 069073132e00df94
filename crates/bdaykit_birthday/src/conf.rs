//! Canonical column names, locale strings and fixed lookup tables.

/// First name column.
pub const C_COL_FIRST_NAME: &str = "Vorname";
/// Last name column.
pub const C_COL_LAST_NAME: &str = "Nachname";
/// Birth date column (parsed to `Date` by the normalizer).
pub const C_COL_BIRTH_DATE: &str = "Geburtsdatum";
/// Display-only birth date column on month sheets.
pub const C_COL_BIRTH_DATE_DISPLAY: &str = "Geburtsdatum (TT.MM.JJJJ)";
/// Company column.
pub const C_COL_COMPANY: &str = "Firma";
/// Street column.
pub const C_COL_STREET: &str = "Strasse";
/// Postal code column.
pub const C_COL_POSTAL_CODE: &str = "PLZ";
/// City column.
pub const C_COL_CITY: &str = "Ort";
/// Canonical membership column.
pub const C_COL_MEMBERSHIP: &str = "Mitgliedschaft";
/// Canonical correspondence language column.
pub const C_COL_CORRESPONDENCE_LANGUAGE: &str = "Korrespondenzsprache";

/// Display format of birth dates.
pub const C_FMT_DATE_DISPLAY: &str = "%d.%m.%Y";

/// Title of the sheet listing rows without a birth date.
pub const C_SHEET_UNDATED: &str = "Ohne_Geburtsdatum";
/// Title of the placeholder sheet emitted when nothing else was written.
pub const C_SHEET_PLACEHOLDER: &str = "Keine_Daten";
/// Header of the placeholder sheet's only column.
pub const C_COL_PLACEHOLDER: &str = "Info";
/// Text of the placeholder sheet's only cell.
pub const C_TEXT_PLACEHOLDER: &str = "Keine Daten vorhanden";

/// Divisor for round birthdays.
pub const N_ROUND_BIRTHDAY_DIVISOR: u32 = 10;

/// Default target year.
pub const N_TARGET_YEAR_DEFAULT: i32 = 2026;
/// Smallest accepted target year.
pub const N_TARGET_YEAR_MIN: i32 = 1900;
/// Largest accepted target year.
pub const N_TARGET_YEAR_MAX: i32 = 2100;

/// German month names, January first.
pub const TUP_MONTH_NAMES: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Membership substrings marking an honorary role (case-sensitive).
pub const TUP_HONORARY_TOKENS: [&str; 3] = ["Ehrenmitglied", "Ehrenpräsident", "Prinzenrolle"];

/// Membership header spellings accepted on month sheets, in priority order.
pub const TUP_MEMBERSHIP_HEADERS: [&str; 4] =
    ["Mitgliedschaft", "mitgliedschaft", "Mitglied", "mitglied"];

/// Columns removed by the normalizer when present.
pub const TUP_OBSOLETE_COLUMNS: [&str; 2] = ["Kontakte", "Anredeart"];

/// `(source, canonical)` renames applied by the normalizer, in order.
pub const TUP_RENAME_MAP: [(&str, &str); 9] = [
    ("Strasse (Korr.)", C_COL_STREET),
    ("PLZ (Korr.)", C_COL_POSTAL_CODE),
    ("Ort (Korr.)", C_COL_CITY),
    ("Korrespondenz Sprache", C_COL_CORRESPONDENCE_LANGUAGE),
    ("Korrespondenz-Sprache", C_COL_CORRESPONDENCE_LANGUAGE),
    ("Korresp. Sprache", C_COL_CORRESPONDENCE_LANGUAGE),
    ("Korresp.-Sprache", C_COL_CORRESPONDENCE_LANGUAGE),
    ("Korrespsprache", C_COL_CORRESPONDENCE_LANGUAGE),
    ("korrespondenzsprache", C_COL_CORRESPONDENCE_LANGUAGE),
];

/// Name of the derived age column for `target_year`.
pub fn derive_age_column_name(target_year: i32) -> String {
    format!("Alter {target_year}")
}

/// German month name for `month` in `1..=12`.
pub fn derive_month_name(month: u32) -> Option<&'static str> {
    let n_idx = usize::try_from(month).ok()?.checked_sub(1)?;
    TUP_MONTH_NAMES.get(n_idx).copied()
}
