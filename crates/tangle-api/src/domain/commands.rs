//! Command registry.
//!
//! Every command the node answers, with the access class it gets when no
//! configuration overrides it and whether it needs a solid subgraph.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// A command name known to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ping,
    AddPeer,
    GetPeerAddresses,
    AttachToMesh,
    BroadcastTransactions,
    FindTransactions,
    GetBalances,
    GetInclusionStates,
    GetNodeInfo,
    GetTips,
    GetTransactionsToApprove,
    GetTrytes,
    InterruptAttachingToMesh,
    StoreTransactions,
}

/// Default access class for remote callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAccess {
    /// Open to every caller.
    Allowed,
    /// Loopback only unless explicitly allowed.
    Restricted,
}

/// Command metadata
#[derive(Debug, Clone)]
pub struct CommandInfo {
    pub command: Command,
    pub name: &'static str,
    pub remote: RemoteAccess,
    /// Refused until the latest solid milestone moves past the start index.
    pub requires_solid: bool,
    pub description: &'static str,
}

impl CommandInfo {
    const fn open(command: Command, name: &'static str, description: &'static str) -> Self {
        Self {
            command,
            name,
            remote: RemoteAccess::Allowed,
            requires_solid: false,
            description,
        }
    }

    const fn restricted(
        command: Command,
        name: &'static str,
        requires_solid: bool,
        description: &'static str,
    ) -> Self {
        Self {
            command,
            name,
            remote: RemoteAccess::Restricted,
            requires_solid,
            description,
        }
    }
}

/// The registry, in dispatch order.
pub static COMMANDS: [CommandInfo; 14] = [
    CommandInfo::open(Command::Ping, "ping", "Echo the caller's address"),
    CommandInfo::open(Command::AddPeer, "addPeer", "Register the caller as a neighbor"),
    CommandInfo::open(
        Command::GetPeerAddresses,
        "getPeerAddresses",
        "List neighbor endpoints",
    ),
    CommandInfo::restricted(
        Command::AttachToMesh,
        "attachToMesh",
        false,
        "Chain payloads onto two parents and perform proof-of-work",
    ),
    CommandInfo::restricted(
        Command::BroadcastTransactions,
        "broadcastTransactions",
        false,
        "Queue payloads for gossip",
    ),
    CommandInfo::restricted(
        Command::FindTransactions,
        "findTransactions",
        false,
        "Search the address, bundle, tag and approver indices",
    ),
    CommandInfo::restricted(
        Command::GetBalances,
        "getBalances",
        false,
        "Confirmed balances as of the latest solid milestone",
    ),
    CommandInfo::restricted(
        Command::GetInclusionStates,
        "getInclusionStates",
        true,
        "Whether transactions are referenced by the given tips",
    ),
    CommandInfo::restricted(Command::GetNodeInfo, "getNodeInfo", false, "Node statistics"),
    CommandInfo::restricted(Command::GetTips, "getTips", false, "Unapproved transactions"),
    CommandInfo::restricted(
        Command::GetTransactionsToApprove,
        "getTransactionsToApprove",
        true,
        "Select two tips to approve",
    ),
    CommandInfo::restricted(Command::GetTrytes, "getTrytes", false, "Raw payloads by hash"),
    CommandInfo::restricted(
        Command::InterruptAttachingToMesh,
        "interruptAttachingToMesh",
        false,
        "Cancel the running proof-of-work",
    ),
    CommandInfo::restricted(
        Command::StoreTransactions,
        "storeTransactions",
        false,
        "Persist payloads into the graph",
    ),
];

static BY_NAME: LazyLock<HashMap<&'static str, &'static CommandInfo>> =
    LazyLock::new(|| COMMANDS.iter().map(|info| (info.name, info)).collect());

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(name).map(|info| info.command)
    }

    pub fn info(self) -> &'static CommandInfo {
        // Registry order matches declaration order.
        &COMMANDS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn requires_solid(self) -> bool {
        self.info().requires_solid
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names of commands with the given default access class.
pub fn names_with_access(remote: RemoteAccess) -> Vec<String> {
    COMMANDS
        .iter()
        .filter(|info| info.remote == remote)
        .map(|info| info.name.to_string())
        .collect()
}
