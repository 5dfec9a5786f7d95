//! The Matrix - Central shared state for the relay server.
//!
//! The Matrix holds all sessions, the nickname index and the channel map
//! behind a single lock. Every structural change (nick claim, join, part,
//! quit) and the member enumeration of its fanout run in one critical
//! section, so no observer ever sees a half-applied change.
//!
//! Fanout never blocks: messages are pushed with `try_send` onto each
//! recipient's bounded queue. A recipient whose queue is full or closed is
//! handed to the disconnect worker once the lock is released.

use crate::config::{Config, IdleTimeoutsConfig, LimitsConfig, UnknownTargetPolicy};
use crate::error::{ChannelError, HandlerError};
use crate::handlers::{names_reply, user_event};
use crate::state::{Uid, UidGenerator};
use parking_lot::Mutex;
use relay_proto::{ChannelExt, Command, Message, irc_to_lower};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Quit reason used when a fanout finds a recipient's queue full or closed.
pub const SEND_QUEUE_EXCEEDED: &str = "Send queue exceeded";

/// A teardown request: session to remove and the reason shown to its peers.
pub type Teardown = (Uid, String);

/// This server's identity information.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub network: String,
}

/// Configuration accessible to handlers via Matrix.
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    pub motd: Vec<String>,
    pub unknown_target: UnknownTargetPolicy,
    pub idle_timeouts: IdleTimeoutsConfig,
    pub limits: LimitsConfig,
}

/// A connected session as seen by the rest of the server.
#[derive(Debug)]
pub struct Session {
    pub uid: Uid,
    pub nick: Option<String>,
    pub user: Option<String>,
    pub realname: Option<String>,
    /// Host token derived from the peer address.
    pub host: String,
    /// Channels this session belongs to.
    pub channels: BTreeSet<String>,
    sender: mpsc::Sender<Message>,
    kill: Arc<Notify>,
}

/// A channel: exists only while it has at least one member.
#[derive(Debug)]
pub struct Channel {
    pub name: String,
    /// Members in join order.
    pub members: Vec<Uid>,
}

impl Channel {
    /// Create a new, empty channel.
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: Vec::new(),
        }
    }

    /// Add a member to the end of the member list.
    pub fn add_member(&mut self, uid: Uid) {
        self.members.push(uid);
    }

    /// Remove a member. Returns whether it was present.
    pub fn remove_member(&mut self, uid: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != uid);
        self.members.len() != before
    }

    /// Check if a session is a member.
    pub fn is_member(&self, uid: &str) -> bool {
        self.members.iter().any(|m| m == uid)
    }
}

/// Outcome of a successful nick claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NickChange {
    /// The session already had exactly this nickname.
    Unchanged,
    /// First nickname for this session.
    Claimed,
    /// The session switched from `old`.
    Renamed { old: String },
}

/// Where a PRIVMSG ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Fanned out to a channel; the count excludes the sender.
    Channel(usize),
    /// Delivered to a single session by nickname.
    Direct,
    /// Neither a channel nor a nickname.
    NoSuchTarget,
}

/// One row of a WHO reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoEntry {
    pub nick: String,
    pub user: String,
    pub host: String,
    pub realname: String,
}

/// Collects recipients whose queue rejected a message during a fanout.
#[derive(Debug, Default)]
struct Outbox {
    failed: Vec<Uid>,
}

impl Outbox {
    fn deliver_to(&mut self, sessions: &HashMap<Uid, Session>, uid: &str, msg: &Message) {
        let Some(session) = sessions.get(uid) else {
            return;
        };
        if session.sender.try_send(msg.clone()).is_err() && !self.failed.iter().any(|f| f == uid) {
            self.failed.push(session.uid.clone());
        }
    }
}

fn session_gone(uid: &str) -> HandlerError {
    HandlerError::Internal(format!("session {} is not attached", uid))
}

/// Everything guarded by the registry lock.
#[derive(Debug, Default)]
struct State {
    sessions: HashMap<Uid, Session>,
    /// Lowercased nickname -> owner.
    nicks: HashMap<String, Uid>,
    /// Channels ordered by name.
    channels: BTreeMap<String, Channel>,
}

impl State {
    fn display_nick(&self, uid: &str) -> Result<String, HandlerError> {
        let session = self.sessions.get(uid).ok_or_else(|| session_gone(uid))?;
        Ok(session.nick.clone().unwrap_or_else(|| "*".to_string()))
    }

    /// The session itself followed by every member of its channels, each once.
    fn audience(&self, uid: &str) -> Vec<Uid> {
        let mut seen = HashSet::new();
        let mut audience = Vec::new();
        seen.insert(uid.to_string());
        audience.push(uid.to_string());

        if let Some(session) = self.sessions.get(uid) {
            for name in &session.channels {
                let Some(channel) = self.channels.get(name) else {
                    continue;
                };
                for member in &channel.members {
                    if seen.insert(member.clone()) {
                        audience.push(member.clone());
                    }
                }
            }
        }
        audience
    }

    fn member_nicks(&self, channel: &Channel) -> Vec<String> {
        channel
            .members
            .iter()
            .filter_map(|m| self.sessions.get(m).and_then(|s| s.nick.clone()))
            .collect()
    }

    fn claim_nick(
        &mut self,
        uid: &str,
        nick: &str,
        announce: bool,
        out: &mut Outbox,
    ) -> Result<NickChange, HandlerError> {
        let lower = irc_to_lower(nick);
        if self.nicks.get(&lower).is_some_and(|owner| owner != uid) {
            return Err(HandlerError::NicknameInUse(nick.to_string()));
        }

        let session = self.sessions.get_mut(uid).ok_or_else(|| session_gone(uid))?;
        if session.nick.as_deref() == Some(nick) {
            return Ok(NickChange::Unchanged);
        }

        let old = session.nick.replace(nick.to_string());
        if let Some(old) = &old {
            self.nicks.remove(&irc_to_lower(old));
        }
        self.nicks.insert(lower, uid.to_string());

        let Some(old) = old else {
            return Ok(NickChange::Claimed);
        };

        if announce {
            let notice = user_event(&old, Command::NICK(nick.to_string()));
            for recipient in self.audience(uid) {
                out.deliver_to(&self.sessions, &recipient, &notice);
            }
        }
        Ok(NickChange::Renamed { old })
    }

    fn join(
        &mut self,
        server: &str,
        uid: &str,
        name: &str,
        out: &mut Outbox,
    ) -> Result<bool, HandlerError> {
        let nick = self.display_nick(uid)?;

        if !name.is_channel_name() {
            return Err(HandlerError::invalid_channel(name));
        }
        if self.channels.get(name).is_some_and(|c| c.is_member(uid)) {
            return Err(HandlerError::Channel {
                channel: name.to_string(),
                error: ChannelError::AlreadyOnChannel,
            });
        }

        let channel = self
            .channels
            .entry(name.to_string())
            .or_insert_with(|| Channel::new(name.to_string()));
        channel.add_member(uid.to_string());
        let created = channel.members.len() == 1;

        if let Some(session) = self.sessions.get_mut(uid) {
            session.channels.insert(name.to_string());
        }

        let Some(channel) = self.channels.get(name) else {
            return Err(HandlerError::Internal(format!("channel {} vanished", name)));
        };
        let echo = user_event(&nick, Command::JOIN(name.to_string()));
        let names = self.member_nicks(channel);

        // The joiner sees its echo and NAMES before anyone else hears of it.
        out.deliver_to(&self.sessions, uid, &echo);
        for reply in names_reply(server, &nick, name, &names) {
            out.deliver_to(&self.sessions, uid, &reply);
        }
        for member in channel.members.iter().filter(|m| *m != uid) {
            out.deliver_to(&self.sessions, member, &echo);
        }

        Ok(created)
    }

    fn part(
        &mut self,
        uid: &str,
        name: &str,
        reason: &str,
        out: &mut Outbox,
    ) -> Result<bool, HandlerError> {
        let nick = self.display_nick(uid)?;
        let not_on_channel = || HandlerError::Channel {
            channel: name.to_string(),
            error: ChannelError::NotOnChannel,
        };

        let Some(channel) = self.channels.get_mut(name) else {
            return Err(not_on_channel());
        };
        if !channel.remove_member(uid) {
            return Err(not_on_channel());
        }
        if let Some(session) = self.sessions.get_mut(uid) {
            session.channels.remove(name);
        }

        let notice = user_event(
            &nick,
            Command::PART(name.to_string(), Some(reason.to_string())),
        );
        out.deliver_to(&self.sessions, uid, &notice);
        for member in &channel.members {
            out.deliver_to(&self.sessions, member, &notice);
        }

        let emptied = channel.members.is_empty();
        if emptied {
            self.channels.remove(name);
        }
        Ok(emptied)
    }

    fn privmsg(
        &mut self,
        uid: &str,
        target: &str,
        text: &str,
        out: &mut Outbox,
    ) -> Result<Delivery, HandlerError> {
        let nick = self.display_nick(uid)?;
        let msg = user_event(
            &nick,
            Command::PRIVMSG(target.to_string(), text.to_string()),
        );

        if let Some(channel) = self.channels.get(target) {
            let mut delivered = 0;
            for member in channel.members.iter().filter(|m| *m != uid) {
                out.deliver_to(&self.sessions, member, &msg);
                delivered += 1;
            }
            return Ok(Delivery::Channel(delivered));
        }

        if let Some(dest) = self.nicks.get(&irc_to_lower(target)) {
            out.deliver_to(&self.sessions, dest, &msg);
            return Ok(Delivery::Direct);
        }

        Ok(Delivery::NoSuchTarget)
    }

    fn quit(&mut self, uid: &str, reason: &str, out: &mut Outbox) -> Option<Session> {
        let session = self.sessions.remove(uid)?;
        let nick = session.nick.clone().unwrap_or_else(|| "*".to_string());

        for name in &session.channels {
            let Some(channel) = self.channels.get_mut(name) else {
                continue;
            };
            channel.remove_member(uid);
            if channel.members.is_empty() {
                self.channels.remove(name);
                continue;
            }
            let notice = user_event(&nick, Command::PART(name.clone(), Some(reason.to_string())));
            for member in &channel.members {
                out.deliver_to(&self.sessions, member, &notice);
            }
        }

        if let Some(nick) = &session.nick {
            let lower = irc_to_lower(nick);
            if self.nicks.get(&lower).is_some_and(|owner| owner == uid) {
                self.nicks.remove(&lower);
            }
        }

        session.kill.notify_one();
        Some(session)
    }

    fn check_invariants(&self) -> Result<(), String> {
        for (name, channel) in &self.channels {
            if channel.members.is_empty() {
                return Err(format!("channel {} has no members", name));
            }
            let unique: HashSet<&Uid> = channel.members.iter().collect();
            if unique.len() != channel.members.len() {
                return Err(format!("channel {} lists a member twice", name));
            }
            for member in &channel.members {
                let in_session = self
                    .sessions
                    .get(member)
                    .is_some_and(|s| s.channels.contains(name));
                if !in_session {
                    return Err(format!("{} is in {} but does not know it", member, name));
                }
            }
        }

        for (uid, session) in &self.sessions {
            for name in &session.channels {
                if !self.channels.get(name).is_some_and(|c| c.is_member(uid)) {
                    return Err(format!("{} thinks it is in {} but is not listed", uid, name));
                }
            }
            if let Some(nick) = &session.nick
                && self.nicks.get(&irc_to_lower(nick)) != Some(uid)
            {
                return Err(format!("nick {} of {} is not indexed", nick, uid));
            }
        }

        if self.nicks.len() != self.sessions.values().filter(|s| s.nick.is_some()).count() {
            return Err("nick index holds stale entries".to_string());
        }
        Ok(())
    }
}

/// The Matrix - Central shared state container.
pub struct Matrix {
    /// This server's identity.
    pub server_info: ServerInfo,

    /// Server configuration (for handlers to access).
    pub config: MatrixConfig,

    /// UID generator for new connections.
    pub uid_gen: UidGenerator,

    state: Mutex<State>,

    /// Sessions whose queue overflowed during a fanout, awaiting teardown.
    disconnect_tx: mpsc::UnboundedSender<Teardown>,
}

impl Matrix {
    /// Create a new Matrix and the receiving end of its teardown channel.
    ///
    /// The receiver must be driven by [`spawn_disconnect_worker`].
    pub fn new(config: &Config) -> (Self, mpsc::UnboundedReceiver<Teardown>) {
        let (disconnect_tx, disconnect_rx) = mpsc::unbounded_channel();
        let matrix = Self {
            server_info: ServerInfo {
                name: config.server.name.clone(),
                network: config.server.network.clone(),
            },
            config: MatrixConfig {
                motd: config.motd.lines.clone(),
                unknown_target: config.messaging.unknown_target,
                idle_timeouts: config.idle_timeouts.clone(),
                limits: config.limits.clone(),
            },
            uid_gen: UidGenerator::new(),
            state: Mutex::new(State::default()),
            disconnect_tx,
        };
        (matrix, disconnect_rx)
    }

    /// Hand overflowed recipients to the disconnect worker.
    fn flush(&self, out: Outbox) {
        for uid in out.failed {
            warn!(%uid, "Outbound queue rejected message, scheduling teardown");
            let _ = self
                .disconnect_tx
                .send((uid, SEND_QUEUE_EXCEEDED.to_string()));
        }
    }

    /// Insert a freshly accepted session. Returns its kill switch.
    pub fn attach(&self, uid: &str, host: &str, sender: mpsc::Sender<Message>) -> Arc<Notify> {
        let kill = Arc::new(Notify::new());
        let session = Session {
            uid: uid.to_string(),
            nick: None,
            user: None,
            realname: None,
            host: host.to_string(),
            channels: BTreeSet::new(),
            sender,
            kill: Arc::clone(&kill),
        };
        self.state.lock().sessions.insert(uid.to_string(), session);
        kill
    }

    /// Atomically claim `nick` for `uid`, releasing its previous one.
    ///
    /// With `announce`, a rename is sent as `:<old> NICK <new>` to the session
    /// and to every member of its channels, each recipient once.
    pub fn claim_nick(&self, uid: &str, nick: &str, announce: bool) -> Result<NickChange, HandlerError> {
        let mut out = Outbox::default();
        let result = self.state.lock().claim_nick(uid, nick, announce, &mut out);
        self.flush(out);
        result
    }

    /// Record username and realname.
    pub fn set_user(&self, uid: &str, user: &str, realname: &str) -> Result<(), HandlerError> {
        let mut state = self.state.lock();
        let session = state.sessions.get_mut(uid).ok_or_else(|| session_gone(uid))?;
        session.user = Some(user.to_string());
        session.realname = Some(realname.to_string());
        Ok(())
    }

    /// Add `uid` to `channel`, creating it if needed. Returns whether it was created.
    pub fn join(&self, uid: &str, channel: &str) -> Result<bool, HandlerError> {
        let mut out = Outbox::default();
        let result = self
            .state
            .lock()
            .join(&self.server_info.name, uid, channel, &mut out);
        self.flush(out);
        result
    }

    /// Remove `uid` from `channel`. Returns whether the channel was deleted.
    pub fn part(&self, uid: &str, channel: &str, reason: &str) -> Result<bool, HandlerError> {
        let mut out = Outbox::default();
        let result = self.state.lock().part(uid, channel, reason, &mut out);
        self.flush(out);
        result
    }

    /// Relay a PRIVMSG to a channel (minus the sender) or to a nickname.
    pub fn privmsg(&self, uid: &str, target: &str, text: &str) -> Result<Delivery, HandlerError> {
        let mut out = Outbox::default();
        let result = self.state.lock().privmsg(uid, target, text, &mut out);
        self.flush(out);
        result
    }

    /// Tear a session down: leave every channel, release the nick and
    /// trigger the worker's kill switch.
    ///
    /// Returns `false` if the session was already gone.
    pub fn quit(&self, uid: &str, reason: &str) -> bool {
        let mut out = Outbox::default();
        let removed = self.state.lock().quit(uid, reason, &mut out);
        self.flush(out);

        match removed {
            Some(session) => {
                info!(
                    %uid,
                    nick = ?session.nick,
                    channels = session.channels.len(),
                    %reason,
                    "Session removed"
                );
                true
            }
            None => {
                debug!(%uid, "Session already removed");
                false
            }
        }
    }

    /// Member nicknames of `channel` in join order.
    pub fn channel_names(&self, channel: &str) -> Option<Vec<String>> {
        let state = self.state.lock();
        let channel = state.channels.get(channel)?;
        Some(state.member_nicks(channel))
    }

    /// WHO rows for `channel` in join order.
    pub fn who(&self, channel: &str) -> Option<Vec<WhoEntry>> {
        let state = self.state.lock();
        let channel = state.channels.get(channel)?;
        let entries = channel
            .members
            .iter()
            .filter_map(|m| state.sessions.get(m))
            .map(|s| WhoEntry {
                nick: s.nick.clone().unwrap_or_else(|| "*".to_string()),
                user: s.user.clone().unwrap_or_else(|| "*".to_string()),
                host: s.host.clone(),
                realname: s.realname.clone().unwrap_or_default(),
            })
            .collect();
        Some(entries)
    }

    /// Every channel with its member count, ordered by name.
    pub fn list(&self) -> Vec<(String, usize)> {
        self.state
            .lock()
            .channels
            .values()
            .map(|c| (c.name.clone(), c.members.len()))
            .collect()
    }

    /// Check if a channel exists.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.state.lock().channels.contains_key(channel)
    }

    /// Resolve a nickname to UID (case-insensitive).
    pub fn uid_for_nick(&self, nick: &str) -> Option<Uid> {
        self.state.lock().nicks.get(&irc_to_lower(nick)).cloned()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Number of live channels.
    pub fn channel_count(&self) -> usize {
        self.state.lock().channels.len()
    }

    /// Verify the registry's structural invariants.
    ///
    /// Membership is mutual, no channel is empty and the nick index matches
    /// the sessions exactly.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.state.lock().check_invariants()
    }
}

/// Drain teardown requests, quitting each session.
pub fn spawn_disconnect_worker(
    matrix: Arc<Matrix>,
    mut disconnect_rx: mpsc::UnboundedReceiver<Teardown>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some((uid, reason)) = disconnect_rx.recv().await {
            if matrix.quit(&uid, &reason) {
                info!(%uid, %reason, "Disconnected by server");
            }
        }
    })
}
