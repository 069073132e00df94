use std::path::Path;

use bdaykit_cli::{Args, run};
use bdaykit_io_xlsx::{SpecXlsxSheetWriteOptions, XlsxWriter, read_table_from_path};
use clap::Parser;
use polars::prelude::{AnyValue, DataFrame, df};

fn write_input(path: &Path, df: &DataFrame) {
    let mut writer = XlsxWriter::new();
    writer
        .write_sheet_from_dataframe(df, "Kontakte", &SpecXlsxSheetWriteOptions::default())
        .unwrap();
    std::fs::write(path, writer.close().unwrap()).unwrap();
}

fn sample() -> DataFrame {
    df![
        "Vorname" => ["Anna", "Bert", "Cleo"],
        "Nachname" => ["Muster", "Beispiel", "Probe"],
        "Geburtsdatum" => [Some("03.07.1950"), None, Some("10.10.1926")],
        "Mitgliedschaft" => ["Aktiv", "Aktiv", "Passiv, Ehrenmitglied"],
        "Kontakte" => ["1", "2", "3"],
    ]
    .unwrap()
}

fn run_to_string(l_args: &[&str]) -> String {
    let args = Args::try_parse_from(l_args).unwrap();
    let mut v_out = Vec::new();
    run(&args, &mut v_out).unwrap();
    String::from_utf8(v_out).unwrap()
}

#[test]
fn test_run_writes_workbook_and_prints_stats() {
    let dir = tempfile::tempdir().unwrap();
    let path_in = dir.path().join("kontakte.xlsx");
    let path_out = dir.path().join("out").join("liste.xlsx");
    write_input(&path_in, &sample());

    let c_out = run_to_string(&[
        "bdaykit",
        path_in.to_str().unwrap(),
        "--output",
        path_out.to_str().unwrap(),
    ]);

    assert!(path_out.exists());
    assert!(c_out.contains("(Juli, Oktober, Ohne_Geburtsdatum)"), "{c_out}");
    assert!(
        c_out.contains("[STATS] names=3 birth_dates=2 birth_dates_missing=1"),
        "{c_out}"
    );

    // First sheet of the report is July.
    let df_july = read_table_from_path(&path_out).unwrap();
    assert_eq!(
        df_july.get_column_names_str(),
        vec![
            "Vorname",
            "Nachname",
            "Geburtsdatum (TT.MM.JJJJ)",
            "Alter 2026",
            "Mitgliedschaft"
        ]
    );
    assert_eq!(
        df_july.column("Vorname").unwrap().get(0).unwrap(),
        AnyValue::String("Anna")
    );
    assert_eq!(
        df_july.column("Alter 2026").unwrap().get(0).unwrap(),
        AnyValue::Int64(76)
    );
}

#[test]
fn test_run_with_active_filter_and_no_undated_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path_in = dir.path().join("kontakte.xlsx");
    let path_out = dir.path().join("aktiv.xlsx");
    write_input(&path_in, &sample());

    let c_out = run_to_string(&[
        "bdaykit",
        path_in.to_str().unwrap(),
        "--only-active",
        "--no-undated-sheet",
        "--year",
        "2030",
        "-o",
        path_out.to_str().unwrap(),
    ]);

    assert!(c_out.contains("(Juli)"), "{c_out}");
    assert!(
        c_out.contains("[STATS] names=2 birth_dates=1 birth_dates_missing=1"),
        "{c_out}"
    );
    let df_july = read_table_from_path(&path_out).unwrap();
    assert_eq!(
        df_july.column("Alter 2030").unwrap().get(0).unwrap(),
        AnyValue::Int64(80)
    );
}

#[test]
fn test_list_columns_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let path_in = dir.path().join("kontakte.xlsx");
    let path_out = dir.path().join("nie.xlsx");
    write_input(&path_in, &sample());

    let c_out = run_to_string(&[
        "bdaykit",
        path_in.to_str().unwrap(),
        "--list-columns",
        "--output",
        path_out.to_str().unwrap(),
    ]);

    assert_eq!(
        c_out.lines().collect::<Vec<_>>(),
        vec!["Vorname", "Nachname", "Geburtsdatum", "Mitgliedschaft", "Kontakte"]
    );
    assert!(!path_out.exists());
}

#[test]
fn test_unreadable_input_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let path_in = dir.path().join("kaputt.xlsx");
    std::fs::write(&path_in, b"not a workbook").unwrap();

    let args = Args::try_parse_from(["bdaykit", path_in.to_str().unwrap()]).unwrap();
    let err = run(&args, &mut Vec::<u8>::new()).unwrap_err();

    assert!(format!("{err:#}").contains("Cannot read input table"));
}
