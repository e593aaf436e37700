//! Raft consensus message types.
//!
//! These are the payloads exchanged between cluster members and clients.
//! The framing layer is generic over the message type; this schema is what
//! a Raft node plugs into [`crate::BincodeCodec`].
//!
//! # Message Flow
//!
//! **Client → Leader**: `CommandName` to append to the replicated log
//!
//! **Leader → Follower**: `AppendEntriesRequest` (also the heartbeat)
//!
//! **Candidate → Peer**: `RequestVoteRequest`
//!
//! Each request has a matching response carrying the responder's term.

use serde::{Deserialize, Serialize};

/// One replicated log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub index: u64,
    pub term: u64,
    pub command_name: String,
}

/// Log replication and heartbeat from the leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntriesRequest {
    pub term: u64,
    pub prev_log_index: u64,
    pub prev_log_term: u64,
    /// Highest index the leader knows to be committed
    pub commit_index: u64,
    pub leader_id: String,
    /// Empty for heartbeats
    pub log_entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntriesResponse {
    pub term: u64,
    pub success: bool,
}

/// Vote solicitation from a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestVoteRequest {
    pub term: u64,
    pub candidate_name: String,
    pub last_log_index: u64,
    pub last_log_term: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestVoteResponse {
    pub term: u64,
    pub vote_granted: bool,
}

/// Envelope for every message a Raft node sends or receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaftMessage {
    /// Client command to replicate.
    CommandName(String),
    AppendEntriesRequest(AppendEntriesRequest),
    AppendEntriesResponse(AppendEntriesResponse),
    RequestVoteRequest(RequestVoteRequest),
    RequestVoteResponse(RequestVoteResponse),
}

impl RaftMessage {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CommandName(_) => "command_name",
            Self::AppendEntriesRequest(_) => "append_entries_request",
            Self::AppendEntriesResponse(_) => "append_entries_response",
            Self::RequestVoteRequest(_) => "request_vote_request",
            Self::RequestVoteResponse(_) => "request_vote_response",
        }
    }

    /// Term carried by the message, if any.
    #[must_use]
    pub const fn term(&self) -> Option<u64> {
        match self {
            Self::CommandName(_) => None,
            Self::AppendEntriesRequest(m) => Some(m.term),
            Self::AppendEntriesResponse(m) => Some(m.term),
            Self::RequestVoteRequest(m) => Some(m.term),
            Self::RequestVoteResponse(m) => Some(m.term),
        }
    }

    /// Heartbeats are append-entries requests without entries.
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::AppendEntriesRequest(m) if m.log_entries.is_empty())
    }
}
