//! In-process storage nodes speaking the subset of RESP the client uses.

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use ringkv::NodeAddress;
use ringkv::NodeDirectory;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::debug;

pub const WAIT_FOR_REPLICA_IN_MS: u64 = 2000;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    Normal,
    /// Answers every SET with an error reply and stores nothing
    ReadOnly,
}

pub struct TestNode {
    addr: String,
    store: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    commands: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl TestNode {
    pub async fn start() -> Self {
        Self::start_with(NodeMode::Normal).await
    }

    pub async fn start_with(mode: NodeMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test node");
        let addr = listener.local_addr().expect("local addr").to_string();
        let store = Arc::new(Mutex::new(HashMap::new()));
        let commands = Arc::new(AtomicUsize::new(0));

        let handle = tokio::spawn({
            let store = store.clone();
            let commands = commands.clone();
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(stream, mode, store.clone(), commands.clone()));
                }
            }
        });

        Self {
            addr,
            store,
            commands,
            handle,
        }
    }

    pub fn addr(&self) -> String {
        self.addr.clone()
    }

    pub fn node(&self) -> NodeAddress {
        NodeAddress::new(self.addr.clone())
    }

    pub fn insert(
        &self,
        key: &str,
        value: &[u8],
    ) {
        self.store.lock().insert(key.to_string(), value.to_vec());
    }

    pub fn value(
        &self,
        key: &str,
    ) -> Option<Vec<u8>> {
        self.store.lock().get(key).cloned()
    }

    pub fn command_count(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    /// Polls until `key` holds `expected`; fire-and-forget writes land asynchronously
    pub async fn wait_for_value(
        &self,
        key: &str,
        expected: &[u8],
    ) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(WAIT_FOR_REPLICA_IN_MS);
        while tokio::time::Instant::now() < deadline {
            if self.value(key).as_deref() == Some(expected) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An address nothing listens on
pub async fn dead_node() -> NodeAddress {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr").to_string();
    drop(listener);
    NodeAddress::new(addr)
}

/// Directory resolving every key to the same ordered node list
pub struct OrderedDirectory {
    nodes: Vec<NodeAddress>,
}

impl OrderedDirectory {
    pub fn new(nodes: Vec<NodeAddress>) -> Arc<Self> {
        Arc::new(Self { nodes })
    }
}

#[async_trait]
impl NodeDirectory for OrderedDirectory {
    async fn connect(
        &self,
        _service_name: &str,
        _endpoints: &[String],
    ) -> ringkv::Result<()> {
        Ok(())
    }

    async fn resolve(
        &self,
        _key: &str,
        count: usize,
    ) -> ringkv::Result<Vec<NodeAddress>> {
        Ok(self.nodes.iter().take(count).cloned().collect())
    }
}

async fn serve(
    stream: TcpStream,
    mode: NodeMode,
    store: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    commands: Arc<AtomicUsize>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    while let Some(args) = read_command(&mut reader).await {
        commands.fetch_add(1, Ordering::SeqCst);
        let name = String::from_utf8_lossy(&args[0]).to_ascii_uppercase();
        debug!(%name, "Test node received command");

        let reply: Vec<u8> = match (name.as_str(), args.len()) {
            ("SET", 3) if mode == NodeMode::ReadOnly => b"-READONLY You can't write against a read only replica.\r\n".to_vec(),
            ("SET", 3) => {
                let key = String::from_utf8_lossy(&args[1]).to_string();
                store.lock().insert(key, args[2].clone());
                b"+OK\r\n".to_vec()
            }
            ("GET", 2) => {
                let key = String::from_utf8_lossy(&args[1]).to_string();
                match store.lock().get(&key) {
                    Some(value) => {
                        let mut out = format!("${}\r\n", value.len()).into_bytes();
                        out.extend_from_slice(value);
                        out.extend_from_slice(b"\r\n");
                        out
                    }
                    None => b"$-1\r\n".to_vec(),
                }
            }
            _ => format!("-ERR unknown command '{name}'\r\n").into_bytes(),
        };

        if writer.write_all(&reply).await.is_err() {
            return;
        }
    }
}

/// Reads one RESP array of bulk strings; `None` on EOF or malformed input
async fn read_command<R>(reader: &mut BufReader<R>) -> Option<Vec<Vec<u8>>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let count: usize = read_header(reader, b'*').await?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let len: usize = read_header(reader, b'$').await?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(buf);
    }
    (!args.is_empty()).then_some(args)
}

async fn read_header<R>(
    reader: &mut BufReader<R>,
    prefix: u8,
) -> Option<usize>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let line = line.trim_end();
    line.strip_prefix(prefix as char)?.parse().ok()
}
