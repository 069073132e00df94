use std::io::{Cursor, Read};

use bdaykit_birthday::{
    BirthdayReportError, OutputBirthdayReport, SpecBirthdayReportOptions, build,
    build_birthday_report, normalize,
};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use polars::prelude::{DataFrame, df};
use zip::ZipArchive;

fn options(include_undated_sheet: bool) -> SpecBirthdayReportOptions {
    SpecBirthdayReportOptions {
        target_year: 2026,
        include_undated_sheet,
    }
}

fn read_sheet(output: &OutputBirthdayReport, sheet_name: &str) -> Vec<Vec<Data>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(output.bytes.clone())).unwrap();
    let range = workbook.worksheet_range(sheet_name).unwrap();
    range.rows().map(|row| row.to_vec()).collect()
}

fn read_sheet_names(output: &OutputBirthdayReport) -> Vec<String> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(output.bytes.clone())).unwrap();
    workbook.sheet_names()
}

fn read_part(output: &OutputBirthdayReport, part_name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(output.bytes.clone())).unwrap();
    let mut c_xml = String::new();
    archive
        .by_name(part_name)
        .unwrap()
        .read_to_string(&mut c_xml)
        .unwrap();
    c_xml
}

fn text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(n) => n.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Empty => String::new(),
        other => format!("{other:?}"),
    }
}

fn number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(n) => Some(*n),
        Data::Int(n) => Some(*n as f64),
        _ => None,
    }
}

#[test]
fn test_regular_birthday_lands_in_july_without_highlight() {
    let df_raw = df![
        "Vorname" => ["Anna"],
        "Nachname" => ["Muster"],
        "Geburtsdatum" => ["03.07.1950"],
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();

    assert_eq!(output.sheet_names(), vec!["Juli"]);
    assert_eq!(read_sheet_names(&output), vec!["Juli".to_string()]);
    assert_eq!(output.sheets[0].cnt_rows_highlighted, vec![0]);

    let l_rows = read_sheet(&output, "Juli");
    assert_eq!(
        l_rows[0].iter().map(text).collect::<Vec<_>>(),
        vec!["Vorname", "Nachname", "Geburtsdatum (TT.MM.JJJJ)", "Alter 2026"]
    );
    assert_eq!(text(&l_rows[1][0]), "Anna");
    assert_eq!(text(&l_rows[1][2]), "03.07.1950");
    assert_eq!(number(&l_rows[1][3]), Some(76.0));
}

#[test]
fn test_hundredth_birthday_is_flagged() {
    let df_raw = df![
        "Vorname" => ["Cleo", "Emil"],
        "Geburtsdatum" => ["10.10.1926", "11.10.1951"],
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();

    assert_eq!(output.sheet_names(), vec!["Oktober"]);
    assert_eq!(output.sheets[0].cnt_rows_highlighted, vec![1]);
    let l_rows = read_sheet(&output, "Oktober");
    assert_eq!(number(&l_rows[1][2]), Some(100.0));
    assert_eq!(number(&l_rows[2][2]), Some(75.0));
}

#[test]
fn test_honorary_tokens_are_case_sensitive_substrings() {
    let df_raw = df![
        "Vorname" => ["A", "B", "C", "D"],
        "Geburtsdatum" => ["01.05.1980", "02.05.1980", "03.05.1980", "04.05.1980"],
        "Mitgliedschaft" => [
            Some("Prinzenrolle 2015"),
            Some("Ehrenmitglied seit 1990"),
            Some("ehrenmitglied"),
            None,
        ],
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();

    assert_eq!(output.sheet_names(), vec!["Mai"]);
    // round birthday, Ehrenmitglied, Ehrenpräsident, Prinzenrolle
    assert_eq!(output.sheets[0].cnt_rows_highlighted, vec![0, 1, 0, 1]);

    let l_rows = read_sheet(&output, "Mai");
    assert_eq!(text(&l_rows[0][3]), "Mitgliedschaft");
    assert_eq!(text(&l_rows[1][3]), "Prinzenrolle 2015");
}

#[test]
fn test_empty_input_yields_placeholder_only() {
    let df_raw = df![
        "Vorname" => Vec::<String>::new(),
        "Geburtsdatum" => Vec::<String>::new(),
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();

    assert_eq!(read_sheet_names(&output), vec!["Keine_Daten".to_string()]);
    let l_rows = read_sheet(&output, "Keine_Daten");
    assert_eq!(text(&l_rows[0][0]), "Info");
    assert_eq!(text(&l_rows[1][0]), "Keine Daten vorhanden");
    assert_eq!(output.stats.cnt_names, Some(0));
    assert_eq!(output.stats.cnt_birth_dates_missing, Some(0));
}

#[test]
fn test_unparseable_date_without_undated_sheet_yields_placeholder() {
    let df_raw = df![
        "Vorname" => ["Bert"],
        "Geburtsdatum" => ["irgendwann"],
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(false)).unwrap();
    assert_eq!(output.sheet_names(), vec!["Keine_Daten"]);

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();
    assert_eq!(output.sheet_names(), vec!["Ohne_Geburtsdatum"]);
    assert_eq!(output.stats.cnt_birth_dates, Some(0));
    assert_eq!(output.stats.cnt_birth_dates_missing, Some(1));
}

#[test]
fn test_sheets_follow_calendar_then_undated() {
    let df_raw = df![
        "Vorname" => ["Dez", "Jan", "Ohne", "Maerz", "Jan2"],
        "Nachname" => ["X", "Y", "Z", "W", "V"],
        "Geburtsdatum" => [Some("24.12.1970"), Some("15.01.1980"), None, Some("01.03.2000"), Some("02.01.1999")],
        "Mitgliedschaft" => ["Aktiv", "Aktiv", "Ehrenpräsident", "Passiv", "Aktiv"],
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();

    assert_eq!(
        output.sheet_names(),
        vec!["Januar", "März", "Dezember", "Ohne_Geburtsdatum"]
    );
    assert_eq!(
        output.sheets.iter().map(|s| s.n_rows).sum::<usize>(),
        df_raw.height()
    );

    let l_rows_jan = read_sheet(&output, "Januar");
    assert_eq!(text(&l_rows_jan[1][0]), "Jan2");
    assert_eq!(text(&l_rows_jan[2][0]), "Jan");

    let undated = &output.sheets[3];
    assert_eq!(undated.cnt_rows_highlighted, vec![0, 1, 0]);
    let l_rows_undated = read_sheet(&output, "Ohne_Geburtsdatum");
    assert_eq!(
        l_rows_undated[0].iter().map(text).collect::<Vec<_>>(),
        vec!["Vorname", "Nachname", "Mitgliedschaft", "Geburtsdatum", "Alter 2026"]
    );
}

#[test]
fn test_month_sheet_places_correspondence_language_after_city() {
    let df_raw = df![
        "Korresp. Sprache" => ["de"],
        "Vorname" => ["Anna"],
        "Ort (Korr.)" => ["Bern"],
        "Geburtsdatum" => ["03.07.1950"],
        "Mitglied" => ["Aktiv"],
        "Kontakte" => ["x"],
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();

    let l_rows = read_sheet(&output, "Juli");
    assert_eq!(
        l_rows[0].iter().map(text).collect::<Vec<_>>(),
        vec![
            "Vorname",
            "Geburtsdatum (TT.MM.JJJJ)",
            "Ort",
            "Korrespondenzsprache",
            "Alter 2026",
            "Mitglied",
        ]
    );
}

#[test]
fn test_missing_birth_date_column_routes_everything_to_undated() {
    let df_raw = df![
        "Vorname" => ["Anna", "Bert"],
        "Mitgliedschaft" => ["Ehrenmitglied", "Aktiv"],
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();

    assert_eq!(output.sheet_names(), vec!["Ohne_Geburtsdatum"]);
    assert_eq!(output.sheets[0].n_rows, 2);
    assert_eq!(output.stats.cnt_names, Some(2));
    assert_eq!(output.stats.cnt_birth_dates, None);
}

#[test]
fn test_build_on_normalized_table_matches_pipeline() {
    let df_raw = df![
        "Vorname" => ["Anna", "Bert"],
        "Geburtsdatum" => ["03.07.1950", "01.01.2026"],
    ]
    .unwrap();
    let options = options(true);

    let df_norm = normalize(&df_raw, options.target_year).unwrap();
    let output = build(&df_norm, &options).unwrap();

    assert_eq!(output.sheet_names(), vec!["Januar", "Juli"]);
    // born in the target year: age 0 is treated as a round birthday
    assert_eq!(output.sheets[0].cnt_rows_highlighted, vec![1]);
    assert_eq!(output.sheets[1].cnt_rows_highlighted, vec![0]);
}

#[test]
fn test_build_rejects_year_outside_range() {
    let options = SpecBirthdayReportOptions {
        target_year: 2101,
        include_undated_sheet: true,
    };
    let err = build_birthday_report(&DataFrame::empty(), &options).unwrap_err();
    assert!(matches!(err, BirthdayReportError::InvalidArgument(_)));
}

#[test]
fn test_worksheet_xml_carries_rules_widths_and_date_style() {
    let df_raw = df![
        "Vorname" => ["A", "B", "C", "D"],
        "Geburtsdatum" => ["01.05.1980", "02.05.1956", "03.05.1980", "04.05.1980"],
        "Mitgliedschaft" => [
            Some("Prinzenrolle 2015"),
            Some("Ehrenmitglied seit 1990"),
            Some("Aktiv"),
            None,
        ],
    ]
    .unwrap();

    let output = build_birthday_report(&df_raw, &options(true)).unwrap();
    assert_eq!(output.sheet_names(), vec!["Mai"]);
    let c_sheet = read_part(&output, "xl/worksheets/sheet1.xml");

    // Columns: A Vorname, B display date, C Alter 2026, D Mitgliedschaft; rows 2..=5.
    assert!(c_sheet.contains(r#"<conditionalFormatting sqref="C2:C5">"#), "{c_sheet}");
    assert!(c_sheet.contains("AND(MOD(C2,10)=0,NOT(ISBLANK(C2)))"), "{c_sheet}");
    assert!(c_sheet.contains(r#"<conditionalFormatting sqref="A2:D5">"#), "{c_sheet}");
    for c_token in ["Ehrenmitglied", "Ehrenpräsident", "Prinzenrolle"] {
        assert!(c_sheet.contains(c_token), "missing rule for {c_token}");
    }
    assert!(c_sheet.contains(",$D2))"), "{c_sheet}");
    assert!(!c_sheet.contains(",$D3))"), "{c_sheet}");

    assert!(c_sheet.contains("<cols>"), "{c_sheet}");
    assert!(c_sheet.contains(r#"width="18.7"#), "{c_sheet}");
    let n_pos_col_date = c_sheet.find(r#"<col min="2" max="2""#).unwrap();
    let c_col_date = &c_sheet[n_pos_col_date..];
    let c_col_date = &c_col_date[..c_col_date.find("/>").unwrap()];
    assert!(c_col_date.contains("style="), "{c_col_date}");

    let c_styles = read_part(&output, "xl/styles.xml");
    assert!(c_styles.contains("dd.mm.yyyy"), "{c_styles}");
    assert!(c_styles.contains("<b/>"), "{c_styles}");
    assert!(c_styles.contains("C6EFCE"), "{c_styles}");
    assert!(c_styles.contains("FFF2CC"), "{c_styles}");
}
