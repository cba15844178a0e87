use super::Registry;
use crate::config::{AddressMode, Config};
use crate::state::{GENERAL, Line, Matrix, SessionGuard, SessionId};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Harness {
    matrix: Arc<Matrix>,
    registry: Registry,
}

struct Client {
    guard: SessionGuard,
    rx: mpsc::Receiver<Line>,
}

impl Harness {
    fn new() -> Self {
        Self {
            matrix: Arc::new(Matrix::new(&Config::default(), AddressMode::Simulated)),
            registry: Registry::new(),
        }
    }

    fn connect(&self) -> Client {
        let (guard, rx) = self.matrix.connect(IpAddr::V4(Ipv4Addr::LOCALHOST));
        Client { guard, rx }
    }

    /// Connect and rename in one step; clears the client's inbox.
    async fn named(&self, name: &str) -> Client {
        let mut c = self.connect();
        c.run(self, &format!("/username {name}")).await;
        c
    }

    fn room_of(&self, c: &Client) -> String {
        self.matrix.room_of(c.id())
    }
}

impl Client {
    fn id(&self) -> SessionId {
        self.guard.session().id()
    }

    /// Dispatch `line` as this client and return what it received in response.
    ///
    /// Anything queued before the call is discarded; use [`Client::drain`] to
    /// inspect notices.
    async fn run(&mut self, h: &Harness, line: &str) -> Vec<String> {
        self.drain();
        h.registry
            .dispatch(&h.matrix, self.guard.session(), line)
            .await
            .unwrap();
        self.drain()
    }

    fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            lines.push(line.to_string());
        }
        lines
    }
}

#[tokio::test]
async fn test_connect_greets_other_members() {
    let h = Harness::new();
    let mut a = h.connect();
    let _b = h.connect();
    assert_eq!(a.drain(), ["[User2 joined the room]"]);
}

#[tokio::test]
async fn test_unknown_command_and_blank_line() {
    let h = Harness::new();
    let mut a = h.connect();
    assert_eq!(a.run(&h, "/dance now").await, ["Unknown command: /dance"]);
    assert_eq!(a.run(&h, "/JOIN Dev").await, ["Unknown command: /JOIN"]);
    assert!(a.run(&h, "   ").await.is_empty());
}

#[tokio::test]
async fn test_usage_errors_do_not_mutate() {
    let h = Harness::new();
    let mut a = h.connect();
    assert_eq!(a.run(&h, "/join").await, ["Usage: /join <roomName> [password]"]);
    assert_eq!(a.run(&h, "/msg bob").await, ["Usage: /msg <username> <message>"]);
    assert_eq!(
        a.run(&h, "/mute bob").await,
        ["Usage: /mute <username|all> <seconds (max 600)>"]
    );
    assert_eq!(a.run(&h, "/username").await, ["Usage: /username <newName>"]);
    assert_eq!(h.matrix.rooms.room_count(), 1);
}

#[tokio::test]
async fn test_rename_and_color() {
    let h = Harness::new();
    let mut a = h.connect();
    assert_eq!(a.run(&h, "/username alice").await, ["Username changed to alice"]);
    assert_eq!(a.run(&h, "/username   ").await, ["Username cannot be empty."]);
    assert_eq!(a.run(&h, "/username a b").await, ["Username cannot contain spaces."]);
    assert_eq!(a.guard.session().username(), "alice");

    assert_eq!(a.run(&h, "/color red").await, ["Color changed to red"]);
    let reply = a.run(&h, "/color pink").await;
    assert_eq!(reply.len(), 1);
    assert!(reply[0].starts_with("Unsupported color. Available: red, green"));
}

#[tokio::test(start_paused = true)]
async fn test_password_room_and_mute_scenario() {
    let h = Harness::new();
    let mut a = h.connect();
    let mut b = h.connect();
    a.drain();

    assert_eq!(
        a.run(&h, "/join Dev secret").await,
        ["Room 'Dev' created with a password."]
    );
    assert_eq!(b.drain(), ["[User1 left the room]"]);
    assert!(h.matrix.rooms.is_room_admin("Dev", "User1"));

    assert_eq!(b.run(&h, "/join Dev wrong").await, ["Incorrect password for room: Dev"]);
    assert_eq!(h.room_of(&b), GENERAL);
    assert_eq!(b.run(&h, "/join Dev").await, ["Incorrect password for room: Dev"]);

    assert_eq!(b.run(&h, "/join Dev secret").await, ["Joined room: Dev"]);
    assert_eq!(a.drain(), ["[User2 joined the room]"]);

    let users = ["Users in room 'Dev':", "- User1", "- User2"];
    assert_eq!(a.run(&h, "/users").await, users);
    assert_eq!(b.run(&h, "/users").await, users);

    assert_eq!(a.run(&h, "/mute user2 700").await, ["Muted user2 for 600 seconds."]);
    assert_eq!(b.drain(), ["You have been muted for 600 seconds."]);

    assert_eq!(b.run(&h, "hello").await, ["You are muted and cannot send messages."]);
    assert!(a.drain().is_empty());

    tokio::time::advance(Duration::from_secs(600)).await;
    assert!(b.run(&h, "hello").await.is_empty());
    assert_eq!(a.drain(), ["\x1b[0mUser2\x1b[0m: hello"]);
}

#[tokio::test]
async fn test_ban_scenario() {
    let h = Harness::new();
    let mut owner = h.named("owner").await;
    let mut x = h.named("xavier").await;
    let mut admin = h.named("admin").await;

    owner.run(&h, "/join R").await;
    x.run(&h, "/join R").await;
    admin.run(&h, "/join R").await;
    owner.drain();
    x.drain();

    assert!(admin.run(&h, "/ban xavier").await.contains(&"[xavier was banned and removed from the room]".to_string()));
    assert_eq!(
        x.drain(),
        ["You have been banned from room: R", "You were moved to the General room."]
    );
    assert_eq!(owner.drain(), ["[xavier was banned and removed from the room]"]);
    assert_eq!(h.room_of(&x), GENERAL);
    assert!(h.matrix.moderation.is_banned("R", x.guard.session().addr()));

    assert_eq!(x.run(&h, "/join R").await, ["You are banned from room: R"]);
    assert_eq!(h.room_of(&x), GENERAL);

    // A new name does not help: bans are by address.
    x.run(&h, "/username someone_else").await;
    assert_eq!(x.run(&h, "/join R").await, ["You are banned from room: R"]);
}

#[tokio::test]
async fn test_creator_is_never_kickable_or_bannable() {
    let h = Harness::new();
    let mut owner = h.named("owner").await;
    let mut admin = h.named("admin").await;
    let mut helper = h.named("helper").await;

    owner.run(&h, "/join Dev").await;
    admin.run(&h, "/join Dev").await;
    helper.run(&h, "/join Dev").await;
    owner.run(&h, "/grant helper").await;

    for caller in [&mut admin, &mut helper] {
        assert_eq!(
            caller.run(&h, "/kick OWNER").await,
            ["You cannot kick the creator of the room."]
        );
        assert_eq!(
            caller.run(&h, "/ban owner").await,
            ["You cannot ban the creator of the room."]
        );
    }
    assert_eq!(h.room_of(&owner), "Dev");
    assert!(!h.matrix.moderation.is_banned("Dev", owner.guard.session().addr()));
}

#[tokio::test]
async fn test_kick_rules() {
    let h = Harness::new();
    let mut owner = h.named("owner").await;
    let mut bob = h.named("bob").await;
    let mut carol = h.named("carol").await;

    assert_eq!(
        carol.run(&h, "/kick bob").await,
        ["You are not authorized to use /kick."]
    );

    owner.run(&h, "/join Dev").await;
    bob.run(&h, "/join Dev").await;
    owner.drain();

    assert_eq!(owner.run(&h, "/kick owner").await, ["You cannot kick yourself."]);
    assert_eq!(
        owner.run(&h, "/kick carol").await,
        ["User 'carol' not found in room 'Dev'."]
    );
    assert_eq!(
        bob.run(&h, "/kick owner").await,
        ["You are not authorized to use /kick."]
    );

    assert_eq!(owner.run(&h, "/kick BOB").await, ["User bob was kicked from the room."]);
    assert_eq!(bob.drain(), ["You were kicked from room 'Dev'. Returned to General."]);
    assert_eq!(h.room_of(&bob), GENERAL);
    h.matrix.rooms.check_invariants().unwrap();
}

#[tokio::test]
async fn test_general_rejects_kick_but_records_ban() {
    let h = Harness::new();
    let mut admin = h.named("admin").await;
    let mut bob = h.named("bob").await;
    assert_eq!(
        admin.run(&h, "/kick bob").await,
        ["You cannot kick users from the General room."]
    );
    assert_eq!(
        admin.run(&h, "/ban bob").await,
        ["[bob was banned from the room]"]
    );
    assert_eq!(
        bob.drain(),
        ["You have been banned from room: General", "[bob was banned from the room]"]
    );
    assert_eq!(h.room_of(&bob), GENERAL);
    assert!(h.matrix.moderation.is_banned(GENERAL, bob.guard.session().addr()));

    bob.run(&h, "/join Dev").await;
    assert_eq!(
        bob.run(&h, "/join General").await,
        ["You are banned from room: General"]
    );
}

#[tokio::test]
async fn test_private_messages() {
    let h = Harness::new();
    let mut alice = h.named("alice").await;
    let mut bob = h.named("bob").await;
    alice.drain();
    bob.run(&h, "/join Elsewhere").await;
    alice.drain();

    assert_eq!(
        alice.run(&h, "/msg ALICE hi").await,
        ["You cannot send a private message to yourself."]
    );
    assert_eq!(
        alice.run(&h, "/msg nobody hi").await,
        ["User nobody not found on the server."]
    );

    alice.run(&h, "/color blue").await;
    assert_eq!(
        alice.run(&h, "/msg Bob hi there  friend").await,
        ["[Private] To Bob: hi there  friend"]
    );
    assert_eq!(bob.drain(), ["[Private] \x1b[34malice\x1b[0m: hi there  friend"]);
}

#[tokio::test]
async fn test_password_command() {
    let h = Harness::new();
    let mut owner = h.named("owner").await;
    let mut bob = h.named("bob").await;
    let mut admin = h.named("admin").await;

    assert_eq!(
        admin.run(&h, "/password x").await,
        ["The General room cannot be password protected."]
    );
    assert_eq!(
        bob.run(&h, "/password x").await,
        ["You are not authorized to use /password."]
    );

    owner.run(&h, "/join Dev").await;
    bob.run(&h, "/join Dev").await;
    assert_eq!(
        bob.run(&h, "/password x").await,
        ["You are not authorized to use /password."]
    );
    assert_eq!(owner.run(&h, "/password hunter2").await, ["Password set for room: Dev"]);
    assert!(h.matrix.rooms.is_protected("Dev"));
    assert_eq!(owner.run(&h, "/password  ").await, ["Password removed for room: Dev"]);
    assert!(!h.matrix.rooms.is_protected("Dev"));
}

#[tokio::test]
async fn test_grant_and_revoke() {
    let h = Harness::new();
    let mut owner = h.named("owner").await;
    let mut bob = h.named("bob").await;
    let mut admin = h.named("admin").await;

    owner.run(&h, "/join Dev").await;
    bob.run(&h, "/join Dev").await;
    admin.run(&h, "/join Dev").await;

    assert_eq!(bob.run(&h, "/grant bob").await, ["You are not authorized to use /grant."]);
    bob.drain();
    assert_eq!(owner.run(&h, "/grant bob").await, ["Granted admin to bob"]);
    assert_eq!(bob.drain(), ["You have been granted admin rights in room: Dev"]);
    assert!(h.matrix.rooms.is_room_admin("Dev", "bob"));

    assert_eq!(
        owner.run(&h, "/revoke bob").await,
        ["Only the server admin can use /revoke."]
    );
    assert_eq!(admin.run(&h, "/revoke bob").await, ["Revoked admin from bob"]);
    assert_eq!(bob.drain(), ["Your admin rights in room: Dev have been revoked."]);
    assert_eq!(
        admin.run(&h, "/revoke bob").await,
        ["User bob is not a room admin."]
    );

    // Creator authority survives a revoke.
    assert_eq!(admin.run(&h, "/revoke owner").await, ["Revoked admin from owner"]);
    assert_eq!(owner.run(&h, "/kick bob").await, ["User bob was kicked from the room."]);
}

#[tokio::test(start_paused = true)]
async fn test_mute_all_muted_and_unmute() {
    let h = Harness::new();
    let mut owner = h.named("owner").await;
    let mut bob = h.named("bob").await;
    let mut carol = h.named("carol").await;
    owner.run(&h, "/join Dev").await;
    bob.run(&h, "/join Dev").await;
    carol.run(&h, "/join Dev").await;
    owner.drain();
    bob.drain();

    assert_eq!(owner.run(&h, "/muted").await, ["No users are currently muted in this room."]);
    assert_eq!(
        owner.run(&h, "/mute bob soon").await,
        ["Invalid time. Must be a number in seconds (max 600)."]
    );
    assert_eq!(
        owner.run(&h, "/mute all 30").await,
        ["All users (except you) have been muted for 30 seconds."]
    );
    assert_eq!(bob.drain(), ["You have been muted for 30 seconds."]);
    assert!(!h.matrix.moderation.is_muted("owner"));

    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(
        bob.run(&h, "/muted").await,
        ["Muted users in this room:", "- bob (20s remaining)", "- carol (20s remaining)"]
    );

    assert_eq!(owner.run(&h, "/unmute bob").await, ["Unmuted bob"]);
    assert_eq!(bob.drain(), ["You have been unmuted."]);
    assert_eq!(owner.run(&h, "/unmute bob").await, ["User bob is not currently muted."]);
    assert_eq!(
        owner.run(&h, "/unmute all").await,
        ["All users in this room have been unmuted."]
    );
    assert!(!h.matrix.moderation.is_muted("carol"));
    assert_eq!(carol.run(&h, "/unmute owner").await, ["You are not authorized to use /unmute."]);
}

#[tokio::test]
async fn test_unban_by_name_and_address() {
    let h = Harness::new();
    let mut owner = h.named("owner").await;
    let mut bob = h.named("bob").await;
    owner.run(&h, "/join Dev").await;
    bob.run(&h, "/join Dev").await;
    owner.run(&h, "/ban bob").await;
    let addr = bob.guard.session().addr();

    assert_eq!(owner.run(&h, "/unban bob").await, ["Unbanned bob from room Dev."]);
    assert_eq!(
        owner.run(&h, "/unban bob").await,
        ["bob is not currently banned from room Dev."]
    );

    h.matrix.moderation.ban("Dev", addr);
    drop(bob);
    assert_eq!(
        owner.run(&h, &format!("/unban {addr}")).await,
        [format!("Unbanned {addr} from room Dev.")]
    );
    assert_eq!(owner.run(&h, "/unban ghost").await, ["User ghost not found on the server."]);
}

#[tokio::test]
async fn test_exit_and_room() {
    let h = Harness::new();
    let mut a = h.connect();
    let mut b = h.connect();
    a.drain();

    assert_eq!(a.run(&h, "/exit").await, ["You're already in the General room."]);
    a.run(&h, "/join Dev").await;
    b.drain();
    assert_eq!(a.run(&h, "/room").await, ["You are currently in room: Dev"]);
    assert_eq!(a.run(&h, "/exit").await, ["You have returned to the General room."]);
    assert_eq!(b.drain(), ["[User1 returned to General]"]);
    assert_eq!(a.run(&h, "/room").await, ["You are currently in room: General"]);
}

#[tokio::test]
async fn test_users_from_general_lists_every_room() {
    let h = Harness::new();
    let mut a = h.connect();
    let mut b = h.connect();
    b.run(&h, "/join Dev pw").await;
    a.drain();

    assert_eq!(
        a.run(&h, "/users").await,
        ["All users by room:", "[Dev] (Password protected):", "- User2", "[General]:", "- User1"]
    );
}

#[tokio::test]
async fn test_shutdown_is_admin_only() {
    let h = Harness::new();
    let mut shutdown = h.matrix.lifecycle.subscribe();
    let mut bob = h.named("bob").await;
    let mut admin = h.named("admin").await;
    bob.drain();

    assert_eq!(bob.run(&h, "/shutdown").await, ["Only the server admin can use /shutdown."]);
    assert!(shutdown.try_recv().is_err());

    assert_eq!(admin.run(&h, "/shutdown").await, ["Server is shutting down..."]);
    assert_eq!(bob.drain(), ["Server is shutting down..."]);
    assert!(shutdown.try_recv().is_ok());
}

#[tokio::test]
async fn test_help_lists_commands() {
    let h = Harness::new();
    let mut a = h.connect();
    let lines = a.run(&h, "/help").await;
    assert_eq!(lines[0], "Available commands:");
    assert!(lines.iter().any(|l| l.contains("/join <roomName> [password]")));
    assert!(lines.iter().any(|l| l.contains("/unban <username|address>")));
    assert_eq!(lines.len(), 19);
    assert!(h.registry.command_stats().iter().any(|(c, n)| *c == "help" && *n == 1));
}

#[tokio::test]
async fn test_only_free_text_arguments_keep_spaces() {
    let h = Harness::new();
    let mut owner = h.named("owner").await;
    let mut bob = h.named("bob").await;
    owner.run(&h, "/join Dev").await;
    bob.run(&h, "/join Dev").await;

    assert_eq!(owner.run(&h, "/grant bob please").await, ["Granted admin to bob"]);
    assert_eq!(
        owner.run(&h, "/kick bob right now").await,
        ["User bob was kicked from the room."]
    );
    assert_eq!(h.room_of(&bob), GENERAL);

    assert_eq!(
        owner.run(&h, "/msg bob see you  later").await,
        ["[Private] To bob: see you  later"]
    );
    assert_eq!(
        bob.run(&h, "/username bob two").await,
        ["Username cannot contain spaces."]
    );
}
