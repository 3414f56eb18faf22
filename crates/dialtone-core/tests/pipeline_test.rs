#![allow(clippy::unwrap_used)]
// Integration tests for the reconciler state machine and the
// provisioner pipeline, against a scripted in-process switch.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use dialtone_core::{
    CoreError, GeneratedConfig, Generator, Inventory, MacAddr, OuiTable, Phone, PhonebookEntry,
    Provisioner, ReconcileError, ReconcileState, Reconciler, StoreConfig, SwitchConfig,
    SyncOutcome, ValidationError,
};

// ── Scripted switch ─────────────────────────────────────────────────

/// What the fake switch does with one accepted connection.
enum SessionScript {
    /// Close before sending the greeting (a transient failure).
    DropImmediately,
    /// Greet, then reject the login.
    RejectLogin,
    /// Greet and acknowledge every action until Logoff.
    Happy,
}

async fn spawn_switch(plan: Vec<SessionScript>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    serve(listener, plan);
    addr
}

async fn spawn_switch_at(addr: SocketAddr, plan: Vec<SessionScript>) {
    let listener = TcpListener::bind(addr).await.unwrap();
    serve(listener, plan);
}

fn serve(listener: TcpListener, plan: Vec<SessionScript>) {
    tokio::spawn(async move {
        for script in plan {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let mut conn = BufReader::new(socket);
            match script {
                SessionScript::DropImmediately => drop(conn),
                SessionScript::RejectLogin => {
                    conn.write_all(b"Asterisk Call Manager/5.0.2\r\n").await.unwrap();
                    let login = read_action(&mut conn).await;
                    let id = field(&login, "ActionID");
                    let response = format!(
                        "Response: Error\r\nActionID: {id}\r\nMessage: Authentication failed\r\n\r\n"
                    );
                    conn.write_all(response.as_bytes()).await.unwrap();
                }
                SessionScript::Happy => run_happy_session(&mut conn).await,
            }
        }
    });
}

async fn run_happy_session(conn: &mut BufReader<TcpStream>) {
    conn.write_all(b"Asterisk Call Manager/5.0.2\r\n").await.unwrap();
    loop {
        let action = read_action(conn).await;
        if action.is_empty() {
            return;
        }
        let id = field(&action, "ActionID").to_owned();
        let name = field(&action, "Action").to_owned();
        let response = format!("Response: Success\r\nActionID: {id}\r\nMessage: ok\r\n\r\n");
        conn.write_all(response.as_bytes()).await.unwrap();
        if name == "Logoff" {
            return;
        }
    }
}

/// Read one blank-line-terminated action into key/value pairs.
async fn read_action(conn: &mut BufReader<TcpStream>) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    loop {
        let mut line = String::new();
        if conn.read_line(&mut line).await.unwrap() == 0 {
            return fields;
        }
        let line = line.trim_end();
        if line.is_empty() {
            return fields;
        }
        if let Some((key, value)) = line.split_once(": ") {
            fields.push((key.to_string(), value.to_string()));
        }
    }
}

fn field<'a>(fields: &'a [(String, String)], key: &str) -> &'a str {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or_default()
}

/// An address with nothing listening on it.
async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// ── Fixtures ────────────────────────────────────────────────────────

fn store_config(dir: &Path) -> StoreConfig {
    StoreConfig {
        phones_path: dir.join("phones.yml"),
        secrets_path: None,
        backup_count: 10,
    }
}

fn switch_config(dir: &Path, enabled: bool, addr: Option<SocketAddr>) -> SwitchConfig {
    let (host, port) = match addr {
        Some(addr) => (addr.ip().to_string(), addr.port()),
        None => ("127.0.0.1".to_owned(), 1),
    };
    SwitchConfig {
        enabled,
        host,
        port,
        username: "dialtone".to_owned(),
        secret: "ami-secret".to_string().into(),
        pjsip_path: dir.join("pjsip_dialtone.conf"),
        extensions_path: dir.join("extensions_dialtone.conf"),
        dialplan_context: "internal".to_owned(),
        dial_timeout_secs: 20,
        fail_on_switch_error: false,
        retry_attempts: 2,
        retry_delay: Duration::ZERO,
        action_timeout: Duration::from_secs(2),
    }
}

fn phone(mac: &str, extension: &str) -> Phone {
    Phone {
        mac: MacAddr::parse(mac).unwrap(),
        model: "T54W".to_owned(),
        extension: extension.to_owned(),
        display_name: format!("Ext {extension}"),
        label: None,
        password: Some("pw".to_owned()),
        transport: None,
        pbx_server: None,
        pbx_port: None,
        codecs: None,
    }
}

fn generated() -> GeneratedConfig {
    let doc = "\
phones:
  - {mac: 001565aabbcc, model: T54W, extension: \"101\", display_name: Front Desk, password: pw}
";
    let inventory = Inventory::from_documents(doc, None).unwrap();
    Generator::new("internal", 20).generate(&inventory)
}

// ── Reconciler state machine ────────────────────────────────────────

#[tokio::test]
async fn test_disabled_integration_writes_config_and_completes() {
    let dir = tempfile::tempdir().unwrap();
    let config = switch_config(dir.path(), false, None);
    let pjsip_path = config.pjsip_path.clone();
    let reconciler = Reconciler::new(config);

    let report = reconciler.reconcile(&generated()).await.unwrap();
    assert_eq!(report.final_state, ReconcileState::Done);
    assert_eq!(report.attempts, 0);
    assert_eq!(
        report.transitions,
        vec![
            ReconcileState::Idle,
            ReconcileState::ConfigWritten,
            ReconcileState::Done,
        ]
    );
    assert!(!report.reload_confirmed());

    let pjsip = fs::read_to_string(pjsip_path).unwrap();
    assert!(pjsip.contains("[101]"));
}

#[tokio::test]
async fn test_reload_succeeds_on_first_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_switch(vec![SessionScript::Happy]).await;
    let reconciler = Reconciler::new(switch_config(dir.path(), true, Some(addr)));

    let report = reconciler.reconcile(&generated()).await.unwrap();
    assert_eq!(report.final_state, ReconcileState::Done);
    assert_eq!(report.attempts, 1);
    assert!(report.reload_confirmed());
    assert!(report.transitions.contains(&ReconcileState::Authenticated));
    assert!(report.transitions.contains(&ReconcileState::ReloadSent));
}

#[tokio::test]
async fn test_transient_failures_retry_the_whole_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_switch(vec![
        SessionScript::DropImmediately,
        SessionScript::DropImmediately,
        SessionScript::Happy,
    ])
    .await;
    let mut config = switch_config(dir.path(), true, Some(addr));
    config.retry_attempts = 3;
    let reconciler = Reconciler::new(config);

    let report = reconciler.reconcile(&generated()).await.unwrap();
    assert_eq!(report.final_state, ReconcileState::Done);
    assert_eq!(report.attempts, 3);
    let connects = report
        .transitions
        .iter()
        .filter(|state| **state == ReconcileState::ConnectAttempted)
        .count();
    assert_eq!(connects, 3);
}

#[tokio::test]
async fn test_exhausted_retries_summarize_one_failure() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_switch(vec![SessionScript::RejectLogin, SessionScript::RejectLogin]).await;
    let reconciler = Reconciler::new(switch_config(dir.path(), true, Some(addr)));

    let error = reconciler.reconcile(&generated()).await.unwrap_err();
    match error {
        ReconcileError::ReloadFailed {
            attempts,
            final_state,
            source,
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(final_state, ReconcileState::Failed);
            assert!(source.is_auth());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_config_write_failure_aborts_before_network() {
    let dir = tempfile::tempdir().unwrap();
    // Point the pjsip target inside a path blocked by a regular file.
    let mut config = switch_config(dir.path(), true, None);
    fs::write(dir.path().join("blocked"), "").unwrap();
    config.pjsip_path = dir.path().join("blocked").join("pjsip.conf");
    let reconciler = Reconciler::new(config);

    let error = reconciler.reconcile(&generated()).await.unwrap_err();
    assert!(matches!(error, ReconcileError::ConfigWrite { .. }), "{error}");
}

// ── Provisioner pipeline ────────────────────────────────────────────

#[tokio::test]
async fn test_mutations_drive_the_full_pipeline_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = Provisioner::open(
        store_config(dir.path()),
        switch_config(dir.path(), false, None),
        OuiTable::builtin(),
    )
    .unwrap();

    let outcome = provisioner.add_phone(phone("001565aabbcc", "101")).await.unwrap();
    assert!(matches!(outcome.sync, SyncOutcome::Done));
    assert!(outcome.warnings.is_empty());

    // Inventory and switch config were both written.
    let raw = fs::read_to_string(dir.path().join("phones.yml")).unwrap();
    assert!(raw.contains("001565aabbcc"));
    let pjsip = fs::read_to_string(dir.path().join("pjsip_dialtone.conf")).unwrap();
    assert!(pjsip.contains("callerid=\"Ext 101\" <101>"));

    // Duplicate add is rejected before anything is persisted.
    let error = provisioner.add_phone(phone("001565aabbcc", "999")).await.unwrap_err();
    assert!(matches!(
        error,
        CoreError::Validation(ValidationError::DuplicateMac { .. })
    ));
    assert_eq!(provisioner.snapshot().phones().len(), 1);

    let status = provisioner.status();
    assert_eq!(status.phone_count, 1);
    assert!(!status.switch_enabled);
    assert!(!status.out_of_sync);
}

#[tokio::test]
async fn test_failed_reload_flags_out_of_sync_and_sync_repairs_it() {
    let dir = tempfile::tempdir().unwrap();
    let addr = dead_addr().await;
    let provisioner = Provisioner::open(
        store_config(dir.path()),
        switch_config(dir.path(), true, Some(addr)),
        OuiTable::builtin(),
    )
    .unwrap();
    let flag = provisioner.out_of_sync();
    assert!(!*flag.borrow());

    // fail_on_switch_error is false: the mutation succeeds, the
    // switch is flagged out of sync.
    let outcome = provisioner.add_phone(phone("001565aabbcc", "101")).await.unwrap();
    match outcome.sync {
        SyncOutcome::OutOfSync(ReconcileError::ReloadFailed { attempts, .. }) => {
            assert_eq!(attempts, 2);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(*flag.borrow());
    assert!(provisioner.status().out_of_sync);

    // The inventory write was durable despite the reload failure.
    let raw = fs::read_to_string(dir.path().join("phones.yml")).unwrap();
    assert!(raw.contains("001565aabbcc"));

    // A switch comes up on the same address; sync repairs the flag.
    spawn_switch_at(addr, vec![SessionScript::Happy]).await;
    let outcome = provisioner.sync().await.unwrap();
    assert!(matches!(outcome.sync, SyncOutcome::Done));
    assert!(!*flag.borrow());
}

#[tokio::test]
async fn test_fail_on_switch_error_fails_the_mutation_but_keeps_the_write() {
    let dir = tempfile::tempdir().unwrap();
    let addr = dead_addr().await;
    let mut config = switch_config(dir.path(), true, Some(addr));
    config.fail_on_switch_error = true;
    let provisioner =
        Provisioner::open(store_config(dir.path()), config, OuiTable::builtin()).unwrap();

    let error = provisioner.add_phone(phone("001565aabbcc", "101")).await.unwrap_err();
    assert!(matches!(
        error,
        CoreError::Reconcile(ReconcileError::ReloadFailed { .. })
    ));
    assert!(provisioner.status().out_of_sync);

    // Persistence success is irreversible: the record is on disk and
    // in the published snapshot.
    let raw = fs::read_to_string(dir.path().join("phones.yml")).unwrap();
    assert!(raw.contains("001565aabbcc"));
    assert_eq!(provisioner.snapshot().phones().len(), 1);
}

#[tokio::test]
async fn test_phonebook_mutations_persist_without_reconciling() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = Provisioner::open(
        store_config(dir.path()),
        switch_config(dir.path(), false, None),
        OuiTable::builtin(),
    )
    .unwrap();

    provisioner
        .add_phonebook_entry(PhonebookEntry {
            name: "Reception".to_owned(),
            number: "100".to_owned(),
        })
        .await
        .unwrap();
    provisioner
        .update_phonebook_entry(1, None, Some("150".to_owned()))
        .await
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("phones.yml")).unwrap();
    assert!(raw.contains("Reception"));
    assert!(raw.contains("150"));
    // No reconcile ran, so no switch config was generated.
    assert!(!dir.path().join("pjsip_dialtone.conf").exists());

    provisioner.remove_phonebook_entry(1).await.unwrap();
    assert!(provisioner.snapshot().phonebook.is_empty());
}

#[tokio::test]
async fn test_render_and_preview_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = Provisioner::open(
        store_config(dir.path()),
        switch_config(dir.path(), false, None),
        OuiTable::builtin(),
    )
    .unwrap();
    provisioner.add_phone(phone("001565aabbcc", "101")).await.unwrap();
    // Clear the files the add wrote so preview can prove it writes
    // nothing of its own.
    fs::remove_file(dir.path().join("pjsip_dialtone.conf")).unwrap();
    fs::remove_file(dir.path().join("extensions_dialtone.conf")).unwrap();

    let mac = MacAddr::parse("001565aabbcc").unwrap();
    let rendered = provisioner.render_device(&mac).unwrap();
    assert!(rendered.starts_with("#!version:1.0.0.1"));

    let preview = provisioner.preview();
    assert!(preview.pjsip.contains("[101]"));
    assert!(!dir.path().join("pjsip_dialtone.conf").exists());
    assert!(!dir.path().join("extensions_dialtone.conf").exists());

    let unknown = MacAddr::parse("aabbccddeeff").unwrap();
    let error = provisioner.render_device(&unknown).unwrap_err();
    assert!(matches!(
        error,
        CoreError::Validation(ValidationError::NotFound { .. })
    ));
}
