use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

const IAC: u8 = 255;
const WILL: u8 = 251;
const DONT: u8 = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Answers like an OpenBSC NITB console
    Normal,
    /// Sends a partial reply to the first command and never prompts again
    Mute,
    /// Like `Normal`, with a log notice right behind the first prompt
    Notice,
}

/// Single-client fake of the controller VTY on a loopback port
pub struct FakeVty {
    pub addr: SocketAddr,
    pub received: Arc<Mutex<Vec<String>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeVty {
    pub fn start(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake vty");
        let addr = listener.local_addr().expect("local addr");
        let received = Arc::new(Mutex::new(Vec::new()));
        let rx = received.clone();
        let handle = thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                let _ = handle_client(stream, behaviour, rx);
            }
        });
        Self {
            addr,
            received,
            handle: Some(handle),
        }
    }

    /// Waits for the client to go away and returns every line it sent
    pub fn finish(mut self) -> Vec<String> {
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
        self.received.lock().unwrap().clone()
    }
}

fn handle_client(mut stream: TcpStream, behaviour: Behaviour, received: Arc<Mutex<Vec<String>>>) -> std::io::Result<()> {
    let mut subscribers: HashMap<u64, String> = HashMap::new();
    subscribers.insert(5, "1000".to_string());
    let mut privileged = false;

    // Option offers first, like the real VTY, then banner and prompt
    stream.write_all(&[IAC, WILL, 1, IAC, WILL, 3, IAC, DONT, 34])?;
    stream.write_all(b"Welcome to the OpenBSC Control interface\r\nOpenBSC> ")?;
    if behaviour == Behaviour::Notice {
        stream.write_all(b"\r\n<0001> abis_nm.c:123 OML link up\r\n")?;
    }

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        // Negotiation answers from the client arrive in front of the first line
        let cmd: String = line
            .iter()
            .filter(|b| b.is_ascii() && !b.is_ascii_control())
            .map(|&b| b as char)
            .collect();
        let cmd = cmd.trim_end().to_string();
        received.lock().unwrap().push(cmd.clone());

        if cmd == "exit" {
            return Ok(());
        }

        // Echo the command line
        stream.write_all(format!("{}\r\n", cmd).as_bytes())?;

        if behaviour == Behaviour::Mute {
            stream.write_all(b"working...\r\n")?;
            continue;
        }

        let words: Vec<&str> = cmd.split_whitespace().collect();
        let reply = match words.as_slice() {
            ["enable"] => {
                privileged = true;
                String::new()
            }
            ["disable"] => {
                privileged = false;
                String::new()
            }
            ["show", "subscriber", "id", id] => match id.parse::<u64>().ok().and_then(|id| subscribers.get(&id).map(|e| (id, e))) {
                Some((id, ext)) => format!("    ID: {}, Authorized: 1\r\n    Extension: {}\r\n", id, ext),
                None => format!("% No subscriber found for id {}\r\n", id),
            },
            ["subscriber", "id", id, "extension", ext] => match id.parse::<u64>().ok().filter(|id| subscribers.contains_key(id)) {
                Some(id) => {
                    subscribers.insert(id, ext.to_string());
                    String::new()
                }
                None => format!("% No subscriber found for id {}\r\n", id),
            },
            _ => "% Unknown command.\r\n".to_string(),
        };
        stream.write_all(reply.as_bytes())?;
        stream.write_all(if privileged { b"OpenBSC# " } else { b"OpenBSC> " })?;
    }
}
