use agentbay_sdk::{
    AgentBay, CreateSessionParams, DirectoryEntry, Error, FileEdit, LabelError, Session,
    WriteMode, DEFAULT_CHUNK_SIZE,
};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> AgentBay {
    AgentBay::builder()
        .endpoint(server.uri())
        .api_key("akm-test-key")
        .build()
        .unwrap()
}

fn ok(request_id: &str, data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "RequestId": request_id,
        "Success": true,
        "Data": data
    }))
}

fn tool_reply(request_id: &str, text: &str, is_error: bool) -> ResponseTemplate {
    ok(
        request_id,
        serde_json::json!({
            "content": [{"type": "text", "text": text}],
            "isError": is_error
        }),
    )
}

async fn created_session(server: &MockServer, client: &AgentBay) -> Session {
    Mock::given(method("POST"))
        .and(path("/CreateMcpSession"))
        .respond_with(ok(
            "req-create",
            serde_json::json!({"SessionId": "sess-1", "ResourceUrl": "https://res/sess-1"}),
        ))
        .mount(server)
        .await;
    client.create(CreateSessionParams::new()).await.unwrap().data
}

fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn session_properties() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = created_session(&server, &client).await;

    assert_eq!(session.session_id(), "sess-1");
    assert_eq!(session.api_key(), "akm-test-key");
    assert!(session.client().unwrap().ptr_eq(&client));
}

#[tokio::test]
async fn validate_labels_messages() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = client.attach("sess-validate");

    assert_eq!(
        session.validate_labels(Some(&labels(&[("key1", "value1"), ("key2", "value2")]))),
        Ok(())
    );
    assert_eq!(
        session.validate_labels(None).unwrap_err().to_string(),
        "Labels cannot be nil. Please provide a valid labels map."
    );
    assert_eq!(
        session
            .validate_labels(Some(&HashMap::new()))
            .unwrap_err()
            .to_string(),
        "Labels cannot be empty. Please provide at least one label."
    );
    assert_eq!(
        session
            .validate_labels(Some(&labels(&[("", "value1")])))
            .unwrap_err()
            .to_string(),
        "Label keys cannot be empty. Please provide valid keys."
    );
    assert_eq!(
        session
            .validate_labels(Some(&labels(&[("key1", "")])))
            .unwrap_err()
            .to_string(),
        "Label values cannot be empty. Please provide valid values."
    );
}

#[tokio::test]
async fn info_maps_desktop_fields() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = created_session(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/GetMcpResource"))
        .and(body_json(serde_json::json!({"SessionId": "sess-1"})))
        .respond_with(ok(
            "req-info",
            serde_json::json!({
                "SessionId": "sess-1",
                "ResourceUrl": "https://res/sess-1",
                "DesktopInfo": {
                    "AppId": "app-9",
                    "AuthCode": "auth",
                    "ConnectionProperties": "{}",
                    "ResourceId": "r-1",
                    "ResourceType": "AIAgent",
                    "Ticket": "ticket-1"
                }
            }),
        ))
        .mount(&server)
        .await;

    let info = session.info().await.unwrap();
    assert_eq!(info.request_id, "req-info");
    assert_eq!(info.data.session_id, session.session_id());
    assert_eq!(info.data.resource_url, "https://res/sess-1");
    assert_eq!(info.data.app_id, "app-9");
    assert_eq!(info.data.resource_type, "AIAgent");
    assert_eq!(info.data.ticket, "ticket-1");
}

#[tokio::test]
async fn get_link_with_every_parameter_combination() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = client.attach("sess-link");

    let cases: [(Option<&str>, Option<u16>, serde_json::Value); 4] = [
        (None, None, serde_json::json!({"SessionId": "sess-link"})),
        (
            Some("https"),
            None,
            serde_json::json!({"SessionId": "sess-link", "ProtocolType": "https"}),
        ),
        (
            None,
            Some(8080),
            serde_json::json!({"SessionId": "sess-link", "Port": 8080}),
        ),
        (
            Some("https"),
            Some(443),
            serde_json::json!({"SessionId": "sess-link", "ProtocolType": "https", "Port": 443}),
        ),
    ];

    for (i, (_, _, body)) in cases.iter().enumerate() {
        Mock::given(method("POST"))
            .and(path("/GetLink"))
            .and(body_json(body.clone()))
            .respond_with(ok(
                &format!("req-link-{i}"),
                serde_json::json!({"Url": format!("https://link/{i}")}),
            ))
            .expect(1)
            .mount(&server)
            .await;
    }

    for (i, (protocol, port, _)) in cases.iter().enumerate() {
        let link = session.get_link(*protocol, *port).await.unwrap();
        assert_eq!(link.request_id, format!("req-link-{i}"));
        assert_eq!(link.data, format!("https://link/{i}"));
    }
}

#[tokio::test]
async fn set_and_get_labels() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = client.attach("sess-labels");

    let wanted = labels(&[("environment", "testing"), ("owner", "team")]);
    Mock::given(method("POST"))
        .and(path("/SetLabel"))
        .and(body_partial_json(serde_json::json!({
            "SessionId": "sess-labels",
            "Labels": {"environment": "testing", "owner": "team"}
        })))
        .respond_with(ok("req-set", serde_json::Value::Null))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/GetLabel"))
        .respond_with(ok(
            "req-get",
            serde_json::json!({"Labels": {"environment": "testing", "owner": "team"}}),
        ))
        .mount(&server)
        .await;

    let set = session.set_labels(&wanted).await.unwrap();
    assert_eq!(set.request_id, "req-set");

    let got = session.get_labels().await.unwrap();
    assert_eq!(got.request_id, "req-get");
    assert_eq!(got.data, wanted);
}

#[tokio::test]
async fn set_invalid_labels_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok("never", serde_json::Value::Null))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let session = client.attach("sess-labels");

    let err = session.set_labels(&HashMap::new()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidLabels(LabelError::Empty)));

    let err = session
        .set_labels(&labels(&[("", "value")]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidLabels(LabelError::EmptyKey)));
}

#[tokio::test]
async fn run_python_code() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = client.attach("sess-code");

    Mock::given(method("POST"))
        .and(path("/CallMcpTool"))
        .and(body_partial_json(serde_json::json!({
            "SessionId": "sess-code",
            "Name": "run_code",
            "Args": {"language": "python", "timeout_s": 60}
        })))
        .respond_with(tool_reply("req-code", "Hello, world!\n2\n", false))
        .expect(1)
        .mount(&server)
        .await;

    let result = session
        .code()
        .run_code("print('Hello, world!')\nprint(1 + 1)", "python", 60)
        .await
        .unwrap();
    assert_eq!(result.request_id, "req-code");
    assert!(result.data.output.contains("Hello, world!"));
    assert!(result.data.output.contains('2'));
}

#[tokio::test]
async fn unsupported_language_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok("never", serde_json::Value::Null))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let session = client.attach("sess-code");
    let err = session
        .code()
        .run_code("puts 'hi'", "ruby", 60)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m.contains("Unsupported language")));
}

#[tokio::test]
async fn execute_command() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = client.attach("sess-cmd");

    Mock::given(method("POST"))
        .and(path("/CallMcpTool"))
        .and(body_partial_json(serde_json::json!({
            "Name": "shell",
            "Args": {"command": "echo 'Hello, AgentBay!'", "timeout_ms": 5000}
        })))
        .respond_with(tool_reply("req-cmd", "Hello, AgentBay!\n", false))
        .mount(&server)
        .await;

    let result = session
        .command()
        .execute_command("echo 'Hello, AgentBay!'", 5000)
        .await
        .unwrap();
    assert_eq!(result.request_id, "req-cmd");
    assert_eq!(result.data.output.trim(), "Hello, AgentBay!");
}

#[tokio::test]
async fn command_tool_error_is_surfaced() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = client.attach("sess-cmd");

    Mock::given(method("POST"))
        .and(path("/CallMcpTool"))
        .respond_with(tool_reply(
            "req-timeout",
            "command timed out after 1000ms",
            true,
        ))
        .mount(&server)
        .await;

    let err = session
        .command()
        .execute_command("sleep 5", 1000)
        .await
        .unwrap_err();
    match err {
        Error::Tool {
            message,
            request_id,
        } => {
            assert_eq!(request_id, "req-timeout");
            assert!(message.contains("timed out"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

fn tool_call(name: &str, args: serde_json::Value) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/CallMcpTool"))
        .and(body_partial_json(serde_json::json!({"Name": name, "Args": args})))
}

#[tokio::test]
async fn huge_code_timeout_does_not_panic() {
    let server = MockServer::start().await;
    tool_call("run_code", serde_json::json!({"timeout_s": u64::MAX}))
        .respond_with(tool_reply("req-forever", "done\n", false))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let session = client.attach("sess-code");
    let result = session
        .code()
        .run_code("print('done')", "python", u64::MAX)
        .await
        .unwrap();
    assert_eq!(result.request_id, "req-forever");
}

#[tokio::test]
async fn tool_timeout_extends_past_client_timeout() {
    let server = MockServer::start().await;
    tool_call("run_code", serde_json::json!({"language": "python"}))
        .respond_with(tool_reply("req-slow", "ok\n", false).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = AgentBay::builder()
        .endpoint(server.uri())
        .api_key("akm-test-key")
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let session = client.attach("sess-slow");
    let result = session
        .code()
        .run_code("print('ok')", "python", 1)
        .await
        .unwrap();
    assert_eq!(result.request_id, "req-slow");
}

#[tokio::test]
async fn file_calls_keep_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CallMcpTool"))
        .respond_with(tool_reply("req-slow", "size: 3", false).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = AgentBay::builder()
        .endpoint(server.uri())
        .api_key("akm-test-key")
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let session = client.attach("sess-slow");
    let err = session.file_system().read_file("/tmp/a.txt").await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn read_and_write_files() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = client.attach("sess-fs");

    tool_call(
        "write_file",
        serde_json::json!({"path": "/tmp/a.txt", "content": "abc", "mode": "append"}),
    )
    .respond_with(tool_reply("req-write", "True", false))
    .expect(1)
    .mount(&server)
    .await;
    tool_call("get_file_info", serde_json::json!({"path": "/tmp/a.txt"}))
        .respond_with(tool_reply(
            "req-info",
            "name: a.txt\nsize: 3\nisDirectory: false",
            false,
        ))
        .expect(1)
        .mount(&server)
        .await;
    tool_call(
        "read_file",
        serde_json::json!({"path": "/tmp/a.txt", "offset": 0, "length": 3}),
    )
    .respond_with(tool_reply("req-read", "abc", false))
    .expect(1)
    .mount(&server)
    .await;

    let fs = session.file_system();
    let written = fs
        .write_file("/tmp/a.txt", "abc", WriteMode::Append)
        .await
        .unwrap();
    assert_eq!(written.request_id, "req-write");

    let read = fs.read_file("/tmp/a.txt").await.unwrap();
    assert_eq!(read.request_id, "req-read");
    assert_eq!(read.data, "abc");
}

#[tokio::test]
async fn large_file_is_read_in_chunks() {
    let server = MockServer::start().await;
    let size = 2 * DEFAULT_CHUNK_SIZE + 1024;
    tool_call("get_file_info", serde_json::json!({"path": "/tmp/big.txt"}))
        .respond_with(tool_reply(
            "req-info",
            &format!("name: big.txt\nsize: {size}\nisDirectory: false"),
            false,
        ))
        .mount(&server)
        .await;
    for (i, offset) in [0, DEFAULT_CHUNK_SIZE, 2 * DEFAULT_CHUNK_SIZE].into_iter().enumerate() {
        tool_call("read_file", serde_json::json!({"offset": offset}))
            .respond_with(tool_reply(&format!("req-read-{i}"), &format!("chunk{i}"), false))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = test_client(&server);
    let session = client.attach("sess-fs");
    let read = session.file_system().read_file("/tmp/big.txt").await.unwrap();
    assert_eq!(read.data, "chunk0chunk1chunk2");
    assert_eq!(read.request_id, "req-read-2");
}

#[tokio::test]
async fn empty_file_needs_no_read() {
    let server = MockServer::start().await;
    tool_call("get_file_info", serde_json::json!({}))
        .respond_with(tool_reply("req-info", "name: e.txt\nsize: 0\nisDirectory: false", false))
        .mount(&server)
        .await;
    tool_call("read_file", serde_json::json!({}))
        .respond_with(tool_reply("never", "", false))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let session = client.attach("sess-fs");
    let read = session.file_system().read_file("/tmp/e.txt").await.unwrap();
    assert_eq!(read.data, "");
    assert_eq!(read.request_id, "req-info");
}

#[tokio::test]
async fn reading_a_directory_fails() {
    let server = MockServer::start().await;
    tool_call("get_file_info", serde_json::json!({}))
        .respond_with(tool_reply("req-info", "name: tmp\nsize: 4096\nisDirectory: true", false))
        .mount(&server)
        .await;
    tool_call("read_file", serde_json::json!({}))
        .respond_with(tool_reply("never", "", false))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let session = client.attach("sess-fs");
    let err = session.file_system().read_file("/tmp").await.unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m.contains("directory")));
}

#[tokio::test]
async fn large_write_is_split_into_appends() {
    let server = MockServer::start().await;
    tool_call("write_file", serde_json::json!({"mode": "overwrite"}))
        .respond_with(tool_reply("req-write-0", "True", false))
        .expect(1)
        .mount(&server)
        .await;
    tool_call("write_file", serde_json::json!({"mode": "append"}))
        .respond_with(tool_reply("req-write-1", "True", false))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let session = client.attach("sess-fs");
    let content = "Lorem ipsum dolor sit amet. ".repeat(2200);
    assert!(content.len() > DEFAULT_CHUNK_SIZE && content.len() < 2 * DEFAULT_CHUNK_SIZE);
    let written = session
        .file_system()
        .write_file("/tmp/large.txt", &content, WriteMode::Overwrite)
        .await
        .unwrap();
    assert_eq!(written.request_id, "req-write-1");
}

#[tokio::test]
async fn directory_operations() {
    let server = MockServer::start().await;
    tool_call("create_directory", serde_json::json!({"path": "/tmp/work"}))
        .respond_with(tool_reply("req-mkdir", "True", false))
        .expect(1)
        .mount(&server)
        .await;
    tool_call("list_directory", serde_json::json!({"path": "/tmp/work"}))
        .respond_with(tool_reply(
            "req-ls",
            "[FILE] file1.txt\n[DIR] dir1\n[FILE] file2.txt",
            false,
        ))
        .expect(1)
        .mount(&server)
        .await;
    tool_call(
        "move_file",
        serde_json::json!({"source": "/tmp/work/file1.txt", "destination": "/tmp/file1.txt"}),
    )
    .respond_with(tool_reply("req-mv", "True", false))
    .expect(1)
    .mount(&server)
    .await;

    let client = test_client(&server);
    let session = client.attach("sess-fs");
    let fs = session.file_system();

    assert_eq!(fs.create_directory("/tmp/work").await.unwrap().request_id, "req-mkdir");

    let listed = fs.list_directory("/tmp/work").await.unwrap();
    assert_eq!(listed.request_id, "req-ls");
    assert_eq!(
        listed.data,
        vec![
            DirectoryEntry { name: "file1.txt".to_string(), is_directory: false },
            DirectoryEntry { name: "dir1".to_string(), is_directory: true },
            DirectoryEntry { name: "file2.txt".to_string(), is_directory: false },
        ]
    );

    let moved = fs
        .move_file("/tmp/work/file1.txt", "/tmp/file1.txt")
        .await
        .unwrap();
    assert_eq!(moved.request_id, "req-mv");
}

#[tokio::test]
async fn file_info_edit_search_and_multi_read() {
    let server = MockServer::start().await;
    tool_call("get_file_info", serde_json::json!({"path": "/tmp/test.txt"}))
        .respond_with(tool_reply(
            "req-info",
            "name: test.txt\nsize: 100\nmodified: 2023-01-01T12:00:00Z\nisDirectory: false",
            false,
        ))
        .mount(&server)
        .await;
    tool_call(
        "edit_file",
        serde_json::json!({
            "path": "/tmp/test.txt",
            "edits": [{"oldText": "foo", "newText": "bar"}],
            "dryRun": false
        }),
    )
    .respond_with(tool_reply("req-edit", "True", false))
    .expect(1)
    .mount(&server)
    .await;
    tool_call(
        "search_files",
        serde_json::json!({"path": "/tmp", "pattern": "test", "excludePatterns": "*.py,node_modules"}),
    )
    .respond_with(tool_reply("req-search", "/tmp/test.txt\n/tmp/sub/test.md\n", false))
    .expect(1)
    .mount(&server)
    .await;
    tool_call(
        "read_multiple_files",
        serde_json::json!({"paths": ["/tmp/a.txt", "/tmp/b.txt"]}),
    )
    .respond_with(tool_reply(
        "req-multi",
        "/tmp/a.txt:\nFile 1 content\n---\n/tmp/b.txt:\nFile 2 content\n---",
        false,
    ))
    .expect(1)
    .mount(&server)
    .await;

    let client = test_client(&server);
    let session = client.attach("sess-fs");
    let fs = session.file_system();

    let info = fs.get_file_info("/tmp/test.txt").await.unwrap();
    assert_eq!(info.request_id, "req-info");
    assert_eq!(info.data.name, "test.txt");
    assert_eq!(info.data.size, 100);
    assert!(!info.data.is_directory);

    let edited = fs
        .edit_file("/tmp/test.txt", &[FileEdit::new("foo", "bar")], false)
        .await
        .unwrap();
    assert_eq!(edited.request_id, "req-edit");

    let found = fs
        .search_files("/tmp", "test", &["*.py", "node_modules"])
        .await
        .unwrap();
    assert_eq!(found.data, vec!["/tmp/test.txt", "/tmp/sub/test.md"]);

    let files = fs
        .read_multiple_files(&["/tmp/a.txt", "/tmp/b.txt"])
        .await
        .unwrap();
    assert_eq!(files.request_id, "req-multi");
    assert_eq!(files.data["/tmp/a.txt"], "File 1 content");
    assert_eq!(files.data["/tmp/b.txt"], "File 2 content");
}

#[tokio::test]
async fn file_tool_error_is_surfaced() {
    let server = MockServer::start().await;
    tool_call("move_file", serde_json::json!({}))
        .respond_with(tool_reply("req-mv", "source does not exist", true))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let session = client.attach("sess-fs");
    let err = session
        .file_system()
        .move_file("/nope", "/tmp/x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Tool { ref message, .. } if message.contains("does not exist")));
}

#[tokio::test]
async fn session_outliving_client_reports_dropped() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let session = client.attach("sess-orphan");
    drop(client);

    assert!(matches!(session.info().await, Err(Error::ClientDropped)));
    assert!(matches!(session.delete().await, Err(Error::ClientDropped)));
    assert!(matches!(session.client(), Err(Error::ClientDropped)));
    // Local data stays readable.
    assert_eq!(session.session_id(), "sess-orphan");
}
