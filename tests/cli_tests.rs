use assert_cmd::Command;
use predicates::str::contains;
use tempfile::{tempdir, TempDir};

const CARD_TEXT: &str = "Your card ending #5678 was used. Purchase at KEELLS SUPER NUGEGODA \
                         for LKR 2,450.00 on 05/03/25 02:15 PM. Call 011 for help.";

fn billmind(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("billmind_cli").expect("binary exists");
    cmd.arg("--data-dir")
        .arg(dir.path())
        .args(["--tz", "UTC", "--no-color"])
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("command runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).expect("utf8 output")
}

#[test]
fn version_prints_build_info() {
    Command::cargo_bin("billmind_cli")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(contains("BillMind"));
}

#[test]
fn imports_accrue_onto_one_card_bill() {
    let dir = tempdir().unwrap();

    billmind(&dir)
        .args(["import", CARD_TEXT])
        .assert()
        .success()
        .stdout(contains("Recorded Keells Super Nugegoda"))
        .stdout(contains("Created Credit Card 5678 due 2025-03-31 23:59"));

    billmind(&dir)
        .arg("import")
        .write_stdin(CARD_TEXT)
        .assert()
        .success()
        .stdout(contains("Added to Credit Card 5678 (now LKR 4900.00)"));

    billmind(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Credit Card 5678"))
        .stdout(contains("4900.00"));

    billmind(&dir)
        .arg("transactions")
        .assert()
        .success()
        .stdout(contains("Keells Super Nugegoda"));

    billmind(&dir)
        .args(["export", "bills"])
        .assert()
        .success()
        .stdout(contains("ID,Name,Date,Amount,Category,PaymentMode,IsPaid"))
        .stdout(contains("Credit Card 5678"));

    assert!(dir.path().join("books").join("default.json").exists());
}

#[test]
fn unrecognised_text_fails_without_writing() {
    let dir = tempdir().unwrap();

    billmind(&dir)
        .args(["import", "Your OTP is 123456"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Error:"));

    assert!(!dir.path().join("books").join("default.json").exists());
}

#[test]
fn paying_a_monthly_bill_rolls_it_over() {
    let dir = tempdir().unwrap();

    let added = stdout_of(billmind(&dir).args([
        "add",
        "--name",
        "Rent",
        "--amount",
        "1500",
        "--due",
        "2099-01-31",
        "--recurrence",
        "monthly",
        "--category",
        "rent",
    ]));
    let id = added
        .split_whitespace()
        .last()
        .expect("bill id printed")
        .to_string();

    billmind(&dir)
        .args(["pay", &id])
        .assert()
        .success()
        .stdout(contains("Marked Rent paid"))
        .stdout(contains("due 2099-02-28 23:59"));

    billmind(&dir)
        .args(["pay", &id])
        .assert()
        .success()
        .stdout(contains("already paid"));

    let listing = stdout_of(billmind(&dir).args(["list", "--all"]));
    assert_eq!(listing.matches("Rent").count(), 4, "{listing}");
    assert!(listing.contains("Paid"));
    assert!(listing.contains("Pending"));
}

#[test]
fn overdue_cannot_be_set_by_hand() {
    let dir = tempdir().unwrap();
    let added = stdout_of(billmind(&dir).args([
        "add", "--name", "Water", "--amount", "30", "--due", "2099-05-01",
    ]));
    let id = added.split_whitespace().last().unwrap().to_string();

    billmind(&dir)
        .args(["status", &id, "overdue"])
        .assert()
        .failure()
        .stderr(contains("Error:"));

    billmind(&dir)
        .args(["status", &id, "cancelled"])
        .assert()
        .success();

    let open = stdout_of(billmind(&dir).arg("list"));
    assert!(open.contains("No bills."));
}

#[test]
fn config_changes_persist_under_data_dir() {
    let dir = tempdir().unwrap();

    billmind(&dir)
        .args(["config", "set", "currency", "usd"])
        .assert()
        .success();

    billmind(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("\"currency\": \"USD\""));

    billmind(&dir)
        .args(["config", "set", "time_zone", "Mars/Olympus"])
        .assert()
        .failure();

    assert!(dir.path().join("config.json").exists());
}

#[test]
fn backups_can_be_listed_and_restored() {
    let dir = tempdir().unwrap();
    billmind(&dir).args(["import", CARD_TEXT]).assert().success();

    let created = stdout_of(billmind(&dir).args(["backup", "--note", "before cleanup"]));
    let name = created.split_whitespace().last().unwrap().to_string();
    assert!(name.contains("before-cleanup"), "{name}");

    billmind(&dir)
        .arg("backups")
        .assert()
        .success()
        .stdout(contains(name.as_str()));

    billmind(&dir)
        .args(["restore", &name])
        .assert()
        .success()
        .stdout(contains("Restored"));
}

#[test]
fn restore_rejects_paths_outside_backups() {
    let dir = tempdir().unwrap();
    billmind(&dir).args(["import", CARD_TEXT]).assert().success();

    billmind(&dir)
        .args(["restore", "../books/default.json"])
        .assert()
        .failure()
        .stderr(contains("Error:"));
    billmind(&dir)
        .args(["config", "restore", "../config.json"])
        .assert()
        .failure()
        .stderr(contains("Error:"));
}

#[test]
fn manual_transactions_are_recorded_and_reconciled() {
    let dir = tempdir().unwrap();

    billmind(&dir)
        .args([
            "add-transaction",
            "--payee",
            "Corner Bakery",
            "--amount",
            "450",
            "--date",
            "2025-03-04 08:30",
            "--category",
            "food",
        ])
        .assert()
        .success()
        .stdout(contains("Recorded Corner Bakery LKR 450.00 on 2025-03-04 08:30"));

    billmind(&dir).args(["import", CARD_TEXT]).assert().success();
    billmind(&dir)
        .args([
            "add-transaction",
            "--payee",
            "Fuel",
            "--amount",
            "550",
            "--date",
            "2025-03-06",
            "--card",
            "5678",
        ])
        .assert()
        .success()
        .stdout(contains("Added to Credit Card 5678 (now LKR 3000.00)"));

    billmind(&dir)
        .arg("transactions")
        .assert()
        .success()
        .stdout(contains("Corner Bakery"))
        .stdout(contains("Manual"))
        .stdout(contains("total: LKR 3450.00"));
}

#[test]
fn invalid_manual_transactions_fail() {
    let dir = tempdir().unwrap();
    for args in [
        ["--payee", "Shop", "--amount=0"],
        ["--payee", "  ", "--amount=10"],
        ["--payee", "Shop", "--amount=-4"],
    ] {
        billmind(&dir)
            .arg("add-transaction")
            .args(args)
            .assert()
            .failure()
            .stderr(contains("Error:"));
    }
    billmind(&dir)
        .args(["add-transaction", "--payee", "Shop", "--amount", "10", "--currency", "US$"])
        .assert()
        .failure()
        .stderr(contains("currency code"));

    billmind(&dir)
        .arg("transactions")
        .assert()
        .success()
        .stdout(contains("No transactions."));
}
