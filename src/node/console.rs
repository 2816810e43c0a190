//! Line-oriented console: reads commands and chat lines, prints messages and status.

use crate::network::dialer::DialOutcome;
use crate::network::events::{NodeEvent, NodeEvents};
use crate::network::manager::FloodNode;
use crate::network::message::Message;
use crate::node::nicknames::NicknameBook;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::debug;

const BLUE: &str = "\x1b[94m";
const BOLD: &str = "\x1b[1m";
const END: &str = "\x1b[0m";

pub fn bold(s: &str) -> String {
    format!("{}{}{}", BOLD, s, END)
}

/// `[text]` in blue.
pub fn status_line(s: &str) -> String {
    format!("{}[{}]{}", BLUE, s, END)
}

pub fn render_message(msg: &Message, book: &NicknameBook) -> String {
    format!("{} {}", bold(&format!("[{}]", book.label(msg.origin()))), msg.body())
}

pub fn render_event(ev: &NodeEvent, book: &NicknameBook) -> String {
    match ev {
        NodeEvent::Received(msg) => render_message(msg, book),
        NodeEvent::Dialing(addr) => status_line(&format!("Dialing {}", addr)),
        NodeEvent::Connected(addr) => status_line(&format!("Connected to {}", addr)),
        NodeEvent::DialFailed { addr, reason } => status_line(&format!("Error dialing {}: {}", addr, reason)),
        NodeEvent::Disconnected(addr) | NodeEvent::InboundClosed(addr) => {
            status_line(&format!("Closed connection to {}", addr))
        }
    }
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Say(String),
    Dial(String),
    SetNick { addr: String, nick: String },
    Peers,
    Unknown(String),
}

/// Blank lines yield `None`. Lines starting with `/` are commands (case-insensitive);
/// anything else is sent as-is.
pub fn parse_line(line: &str) -> Option<Input> {
    if line.trim().is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(Input::Say(line.to_string()));
    }

    let lowered = line.trim().to_lowercase();
    let parts: Vec<&str> = lowered.split_whitespace().collect();
    let input = match parts.as_slice() {
        ["/dial", addr] => Input::Dial(addr.to_string()),
        ["/setnick", addr, nick] => Input::SetNick { addr: addr.to_string(), nick: nick.to_string() },
        ["/peers"] => Input::Peers,
        _ => Input::Unknown(lowered.clone()),
    };
    Some(input)
}

/// Apply one input to the node. Returns a line for the user, if any.
pub fn handle_input(node: &FloodNode, book: &NicknameBook, input: Input) -> Option<String> {
    match input {
        Input::Say(body) => {
            let msg = node.submit_local_message(body);
            debug!("sent {}", msg.id());
            None
        }
        Input::Dial(addr) => match node.connect_to_peer(&addr) {
            DialOutcome::Spawned => None,
            DialOutcome::AlreadyConnected => Some(status_line(&format!("Already connected to {}", addr))),
            DialOutcome::SelfDial => Some(status_line("Not dialing yourself")),
        },
        Input::SetNick { addr, nick } => {
            book.set(&addr, &nick);
            Some(status_line(&format!("{} nicknamed {}", addr, nick)))
        }
        Input::Peers => {
            let peers = node.peers();
            if peers.is_empty() {
                Some(status_line("No peers"))
            } else {
                let labelled: Vec<String> = peers
                    .iter()
                    .map(|a| format!("{} ({})", a, book.label(a)))
                    .collect();
                Some(status_line(&format!("Peers: {}", labelled.join(", "))))
            }
        }
        Input::Unknown(cmd) => Some(status_line(&format!("Unknown command {}", cmd))),
    }
}

/// Read lines from `reader` until EOF or shutdown.
pub async fn run_input<R>(
    node: FloodNode,
    book: NicknameBook,
    reader: R,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("console input closed");
                    return Ok(());
                };
                if let Some(input) = parse_line(&line) {
                    if let Some(out) = handle_input(&node, &book, input) {
                        println!("{}", out);
                    }
                }
            }
        }
    }
}

/// Print every node event until shutdown or until the node goes away.
pub async fn run_printer(
    mut events: NodeEvents,
    book: NicknameBook,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            ev = events.recv() => match ev {
                Some(ev) => println!("{}", render_event(&ev, &book)),
                None => return Ok(()),
            },
        }
    }
}
