use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::str::contains;

fn tally(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tally_cli").expect("binary");
    cmd.env("TALLY_CLI_SCRIPT", "1")
        .env("TALLY_HOME", home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let home = TempDir::new().expect("tempdir");
    let export = home.path().join("report.csv");
    let input = format!(
        "bootstrap admin admin@example.com \"correct horse\"\n\
         add Jan-25 sanciones 100\n\
         add Feb-25 ingresos_mantenimiento 1,000.50\n\
         periods\n\
         export Jan-25 Feb-25 {} --totals values\n\
         exit\n",
        export.display()
    );

    tally(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Administrator admin created"))
        .stdout(contains("Jan-25, Feb-25"))
        .stdout(contains("Exported 2 period(s)"));

    let csv = std::fs::read_to_string(&export).expect("export written");
    assert!(csv.lines().last().unwrap_or_default().starts_with("TOTAL,1000.50,"));

    let book = std::fs::read_to_string(home.path().join("book.json")).expect("book");
    assert!(book.contains("\"sanctions\": \"100.00\""));
}

#[test]
fn errors_are_reported_and_the_script_continues() {
    let home = TempDir::new().expect("tempdir");
    let input = "add Jan-25 sanciones 10\n\
                 bootstrap admin admin@example.com \"correct horse\"\n\
                 add Jan-25 propinas 10\n\
                 add Jan-25 sanciones 1.005\n\
                 recrods\n\
                 records\n";

    tally(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stderr(contains("Permission denied: not logged in"))
        .stderr(contains("propinas"))
        .stdout(contains("Suggestion: `records`?"))
        .stdout(contains("No records yet."));
}

#[test]
fn state_persists_between_runs() {
    let home = TempDir::new().expect("tempdir");
    tally(&home)
        .write_stdin("bootstrap admin admin@example.com \"correct horse\"\nadd Mar-25 sanciones 7\n")
        .assert()
        .success();

    tally(&home)
        .write_stdin("login admin \"correct horse\"\nwhoami\nshow Mar-25\nmovements\n")
        .assert()
        .success()
        .stdout(contains("Logged in as admin (admin)"))
        .stdout(contains("admin <admin@example.com> role: admin"))
        .stdout(contains("Added 7.00 to 'sanciones' in Mar-25"));
}
