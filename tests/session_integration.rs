//! End-to-end runs of a session over files written to disk.

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use rusty_ega::analysis::timeline::TimeEvent;
use rusty_ega::comparison::ComparisonSet;
use rusty_ega::config::EngineConfig;
use rusty_ega::data::loader::{
    load_gas_signal_file, load_spectra_file, load_thermogravimetric_file, read_table_file,
};
use rusty_ega::error::DataError;
use rusty_ega::state::{SessionState, StreamStatus};

const TG_CSV: &str = "\
Time (min),Unsubtracted Weight (mg),Baseline Weight (mg),Program Temperature (°C),Sample Temperature (°C)
0.0,10.0,0.0,30.0,29.5
0.5,8.0,0.0,35.0,34.5
1.0,6.0,0.0,40.0,39.5
1.5,4.0,0.0,45.0,44.5
2.0,2.0,0.0,50.0,49.5
";

const GS_CSV: &str = "\
Instrument,QMS
Channel,m/z 44

Time (s),Ion current (A)
0,1.0e-11
30,2.0e-11
60,5.0e-11
90,3.0e-11
120,1.5e-11
";

const FTIR_CSV: &str = "\
cm-1;0,5;40,5;80,5;120,5
4000,0;99,10;98,20;97,30;96,40
3000,0;95,00;90,00;85,00;80,00
2000,0;91,50;82,50;73,50;64,50
";

fn write(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn session_from_files(dir: &Path) -> SessionState {
    let tg = write(dir, "tg.csv", TG_CSV.as_bytes());
    let gs = write(dir, "gs.csv", GS_CSV.as_bytes());
    let ftir = write(dir, "ftir.csv", FTIR_CSV.as_bytes());

    let mut session = SessionState::new(EngineConfig::default());
    let tg_series = load_thermogravimetric_file(&tg, &session.config).unwrap();
    session.set_thermogravimetric("tg.csv", tg_series);
    session.set_gas_signal("gs.csv", load_gas_signal_file(&gs).unwrap());
    session.set_spectra("ftir.csv", load_spectra_file(&ftir).unwrap());
    session
}

#[test]
fn files_load_into_a_ready_session() {
    let dir = tempdir().unwrap();
    let session = session_from_files(dir.path());
    assert!(session.is_ready());

    let tg = session.thermogravimetric.as_ref().unwrap();
    assert_eq!(tg.time, vec![0.0, 30.0, 60.0, 90.0, 120.0]);
    assert_eq!(tg.sample_temperature[0], 29.5);

    let gs = session.gas_signal.as_ref().unwrap();
    assert_eq!(gs.len(), 5);
    assert_eq!(gs.domain().max, 120.0);

    let ftir = session.spectra.as_ref().unwrap();
    assert_eq!(ftir.times, vec![0.5, 40.5, 80.5, 120.5]);
    assert_eq!(ftir.wavenumbers, vec![4000.0, 3000.0, 2000.0]);
    assert_eq!(ftir.transmittance[1], vec![98.2, 90.0, 82.5]);
}

#[test]
fn synchronized_view_follows_the_selected_time() {
    let dir = tempdir().unwrap();
    let mut session = session_from_files(dir.path());

    let view = session.apply_event(TimeEvent::ManualInput(Some(45.7))).unwrap();
    assert_eq!(view.selected_time.value, 45.7);
    assert_eq!(view.spectrum.time, 40.5);
    assert_eq!(view.dtg.normalized_mass, vec![100.0, 75.0, 50.0, 25.0, 0.0]);
    assert_eq!(view.initial_mass_label, "Initial mass: 10.00 mg");
    assert_eq!(view.temperature_program.y, vec![30.0, 35.0, 40.0, 45.0, 50.0]);
    assert!(view.info.starts_with("Selected time (GS): 45.7s | Closest FTIR time: 40.5s"));
    assert!(view.info.ends_with("Interpolated temperature (TG): 37.1°C"));

    // Out-of-range drags are clamped to the gas-signal range.
    let view = session
        .apply_event(TimeEvent::DragShape { x0: Some(1e6), x1: None })
        .unwrap();
    assert_eq!(view.selected_time.value, 120.0);
    assert_eq!(view.spectrum.time, 120.5);
    assert_eq!(session.manual_time, Some(120.0));
}

#[test]
fn pins_accumulate_and_survive_reloads() {
    let dir = tempdir().unwrap();
    let mut session = session_from_files(dir.path());

    session.apply_event(TimeEvent::ManualInput(Some(0.0))).unwrap();
    session.pin_current(Some("start".into())).unwrap();
    session.apply_event(TimeEvent::ManualInput(Some(80.0))).unwrap();
    session.pin_current(None).unwrap();

    let pins = session.pins();
    assert_eq!(pins.len(), 2);
    assert_eq!(pins[0].label, "start");
    assert_eq!(pins[0].transmittance, vec![99.1, 95.0, 91.5]);
    assert_ne!(pins[0].color, pins[1].color);

    // Re-uploading a stream does not touch pins, but pinning needs a new view.
    session
        .load_spectra_bytes("ftir.csv", FTIR_CSV.as_bytes())
        .unwrap();
    assert_eq!(session.pins().len(), 2);
    assert!(matches!(session.pin_current(None), Err(DataError::NotReady(_))));

    let view = session.apply_event(TimeEvent::None).unwrap();
    assert_eq!(view.pins.len(), 2);
    assert_eq!(view.selected_time.value, 80.0);
}

#[test]
fn broken_upload_is_reported_and_previous_data_kept() {
    let dir = tempdir().unwrap();
    let mut session = session_from_files(dir.path());
    let before = session.thermogravimetric.clone();

    let err = session
        .load_thermogravimetric_bytes("bad.csv", b"Time,Weight,Sample Temperature\n0,abc,30\n")
        .unwrap_err();
    assert!(matches!(err, DataError::InvalidNumber { row: 1, .. }));
    assert_eq!(session.thermogravimetric, before);
    match &session.status.thermogravimetric {
        StreamStatus::Failed { name, message } => {
            assert_eq!(name, "bad.csv");
            assert!(message.contains("abc"));
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert!(session.apply_event(TimeEvent::None).is_ok());
}

#[test]
fn latin1_tg_export_is_decoded() {
    let mut bytes = b"Time (min);Weight (mg);Sample Temperature (".to_vec();
    bytes.push(0xB0);
    bytes.extend_from_slice(b"C)\n0;5,0;25,0\n1;4,0;35,0\n2;3,0;45,0\n");

    let mut session = SessionState::default();
    session.load_thermogravimetric_bytes("latin1.txt", &bytes).unwrap();
    let tg = session.thermogravimetric.as_ref().unwrap();
    assert_eq!(tg.mass, vec![5.0, 4.0, 3.0]);
    assert_eq!(tg.time, vec![0.0, 60.0, 120.0]);
}

#[test]
fn excel_uploads_are_rejected() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "run.xlsx", b"PK\x03\x04");
    let err = read_table_file(&path).unwrap_err();
    assert!(err.to_string().contains("not supported"));
}

#[test]
fn comparison_of_runs_from_disk() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "run_a.csv", TG_CSV.as_bytes());
    let b = write(
        dir.path(),
        "run_b.csv",
        TG_CSV.replace("10.0,", "12.0,").as_bytes(),
    );

    let mut set = ComparisonSet::default();
    for path in [&a, &b, &a] {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        set.add_run(&name, &read_table_file(path).unwrap()).unwrap();
    }
    assert_eq!(set.len(), 2);

    let curves = set.normalized_curves();
    assert_eq!(curves[0].x, vec![29.5, 34.5, 39.5, 44.5, 49.5]);
    assert_eq!(curves[1].y[0], 100.0);
    assert_eq!(set.dtg_curves().unwrap().len(), 2);
}

#[test]
fn semicolon_gas_signal_with_title_line_loads() {
    let mut session = SessionState::default();
    session
        .load_gas_signal_bytes(
            "qms.txt",
            b"QMS export\n\nTime (s);Signal\n0;0,1\n60;0,4\n120;0,2\n",
        )
        .unwrap();
    let gs = session.gas_signal.as_ref().unwrap();
    assert_eq!(gs.time, vec![0.0, 60.0, 120.0]);
    assert_eq!(gs.signal, vec![0.1, 0.4, 0.2]);
    assert!(matches!(session.status.gas_signal, StreamStatus::Loaded { .. }));
}
