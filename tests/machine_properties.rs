//! Randomized sweeps over the pure machines
//!
//! Each seed drives a machine through a few hundred random events against a
//! simulated server and checks the machine invariants after every step.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bank_fsm::auth::{AuthEffect, AuthReply, Credentials, SessionGrant, SessionToken};
use bank_fsm::data::{DataEffect, DataReply};
use bank_fsm::{
    AuthEvent, AuthMachine, AuthState, BankAccount, BankAccountDraft, BankAccountsMachine,
    DataEvent, DataState, Failure, Machine, NewUser, ProfilePatch, SuccessState, Ticket, User,
};

const SEEDS: u64 = 64;
const STEPS: usize = 300;

// ============================================================================
// Data Machine
// ============================================================================

struct DataWorld {
    rng: StdRng,
    machine: BankAccountsMachine,
    server: Vec<BankAccount>,
    /// Effect issued and not yet answered
    pending: Option<DataEffect<BankAccount>>,
    /// Tickets already answered or abandoned
    spent: Vec<Ticket>,
    next_id: usize,
}

impl DataWorld {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            machine: BankAccountsMachine::new("bank_accounts"),
            server: Vec::new(),
            pending: None,
            spent: Vec::new(),
            next_id: 0,
        }
    }

    fn draft(&mut self) -> BankAccountDraft {
        if self.rng.gen_bool(0.2) {
            // Routing number too short
            BankAccountDraft::new("Broken Bank", "12", "987654321")
        } else {
            let n = self.rng.gen_range(0..1000);
            BankAccountDraft::new(format!("Bank of {}", n), "123456789", "987654321")
        }
    }

    fn known_or_unknown_id(&mut self) -> String {
        let records = self.machine.records();
        if !records.is_empty() && self.rng.gen_bool(0.8) {
            let i = self.rng.gen_range(0..records.len());
            records[i].id.clone()
        } else {
            "missing".to_string()
        }
    }

    fn user_event(&mut self) -> DataEvent<BankAccount> {
        match self.rng.gen_range(0..4) {
            0 => DataEvent::fetch(),
            1 => DataEvent::Create(self.draft()),
            2 => {
                let records = self.machine.records();
                if records.is_empty() {
                    return DataEvent::fetch();
                }
                let mut record = records[self.rng.gen_range(0..records.len())].clone();
                record.bank_name = format!("Renamed {}", self.rng.gen_range(0..1000));
                DataEvent::Update(record)
            }
            _ => DataEvent::Delete(self.known_or_unknown_id()),
        }
    }

    /// Answer the pending effect the way a server would, or fail it
    fn answer(&mut self, effect: DataEffect<BankAccount>) -> DataEvent<BankAccount> {
        let ticket = effect.ticket();
        self.spent.push(ticket);

        if self.rng.gen_bool(0.25) {
            let status = [400u16, 401, 404, 500][self.rng.gen_range(0..4)];
            return DataEvent::Rejected {
                ticket,
                failure: Failure::from_status(status, "scripted"),
            };
        }

        let reply = match effect {
            DataEffect::List { .. } => DataReply::Listed(self.server.clone()),
            DataEffect::Create { draft, .. } => {
                self.next_id += 1;
                let record = BankAccount::new(
                    format!("acc-{}", self.next_id),
                    draft.bank_name,
                    draft.routing_number,
                    draft.account_number,
                );
                self.server.push(record.clone());
                DataReply::Created(record)
            }
            DataEffect::Update { record, .. } => {
                if let Some(slot) = self.server.iter_mut().find(|r| r.id == record.id) {
                    *slot = record.clone();
                }
                DataReply::Updated(record)
            }
            DataEffect::Delete { id, .. } => {
                self.server.retain(|r| r.id != id);
                DataReply::Deleted
            }
        };
        DataEvent::Resolved { ticket, reply }
    }

    fn stale_reply(&mut self) -> Option<DataEvent<BankAccount>> {
        if self.spent.is_empty() {
            return None;
        }
        let ticket = self.spent[self.rng.gen_range(0..self.spent.len())];
        Some(DataEvent::Resolved {
            ticket,
            reply: DataReply::Listed(vec![BankAccount::new(
                "ghost",
                "Ghost Bank",
                "123456789",
                "987654321",
            )]),
        })
    }

    fn step(&mut self) {
        let before_state = self.machine.state();
        let before_records = self.machine.records().to_vec();

        let roll = self.rng.gen_range(0..10);
        let (event, answering, stale) = if roll < 5 && self.pending.is_some() {
            let effect = self.pending.take().expect("pending checked");
            (self.answer(effect), true, false)
        } else if roll == 5 {
            match self.stale_reply() {
                Some(event) => (event, false, true),
                None => (self.user_event(), false, false),
            }
        } else {
            (self.user_event(), false, false)
        };

        let listed = matches!(
            event,
            DataEvent::Resolved {
                reply: DataReply::Listed(_),
                ..
            }
        );
        let user_issued = !answering && !stale;
        let step = self.machine.send(event);

        // Stale and late replies never move the machine
        if stale {
            assert!(!step.handled);
            assert_eq!(self.machine.state(), before_state);
            assert_eq!(self.machine.records(), &before_records[..]);
        }

        // Only a fresh list reply replaces records
        if !(answering && listed) {
            assert_eq!(self.machine.records(), &before_records[..]);
        }

        // In-flight states accept nothing from the user
        if user_issued && before_state.is_in_flight() {
            assert!(!step.handled);
            assert!(step.effect.is_none());
        }

        // At most one adapter call outstanding
        if let Some(effect) = step.effect {
            assert!(self.pending.is_none(), "second call issued while one is pending");
            assert_eq!(self.machine.outstanding(), Some(effect.ticket()));
            if user_issued {
                assert!(self.machine.last_error().is_none());
            }
            self.pending = Some(effect);
        }

        let state = self.machine.state();
        assert_eq!(state.is_in_flight(), self.pending.is_some());
        if let DataState::Success(sub) = state {
            assert_eq!(sub, SuccessState::for_len(self.machine.records().len()));
        }
        if state == DataState::Idle {
            assert!(self.machine.records().is_empty());
        }
    }
}

#[test]
fn test_data_machine_invariants_hold_under_random_events() {
    for seed in 0..SEEDS {
        let mut world = DataWorld::new(seed);
        for _ in 0..STEPS {
            world.step();
        }
    }
}

#[test]
fn test_data_machine_converges_to_server_state() {
    for seed in 0..SEEDS {
        let mut world = DataWorld::new(seed);
        for _ in 0..STEPS {
            world.step();
        }
        // Drain, then fetch once more with a cooperative server
        if let Some(effect) = world.pending.take() {
            let ticket = effect.ticket();
            world.machine.send(DataEvent::Rejected {
                ticket,
                failure: Failure::server("drained"),
            });
        }
        let step = world.machine.send(DataEvent::fetch());
        let ticket = step.effect.expect("fetch from rest issues a list").ticket();
        world.machine.send(DataEvent::Resolved {
            ticket,
            reply: DataReply::Listed(world.server.clone()),
        });
        assert_eq!(world.machine.records(), &world.server[..]);
        assert!(world.machine.state().is_success());
    }
}

// ============================================================================
// Auth Machine
// ============================================================================

fn auth_user() -> User {
    User::new("t45AiwidW", "Giovanna", "Smith", "Giovanna74")
}

fn auth_event(rng: &mut StdRng) -> AuthEvent {
    match rng.gen_range(0..6) {
        0 => AuthEvent::CheckSession,
        1 => AuthEvent::Login(Credentials::new("Giovanna74", "s3cret", false)),
        2 => AuthEvent::Signup(NewUser::new("Edgar", "Johns", "edgar_j", "p4ssw0rd")),
        3 => AuthEvent::Refresh,
        4 => AuthEvent::Update(ProfilePatch::default().first_name("Kaden")),
        _ => AuthEvent::Logout,
    }
}

fn auth_answer(rng: &mut StdRng, effect: &AuthEffect, issued: &mut usize) -> Option<AuthEvent> {
    let ticket = effect.ticket()?;
    if rng.gen_bool(0.3) {
        let status = [401u16, 403, 422, 500][rng.gen_range(0..4)];
        return Some(AuthEvent::Rejected {
            ticket,
            failure: Failure::from_status(status, "scripted"),
        });
    }
    let reply = match effect {
        AuthEffect::UpdateProfile { .. } => AuthReply::Profile(auth_user()),
        _ => {
            *issued += 1;
            AuthReply::Session(SessionGrant::new(
                SessionToken::new(format!("session-{}", issued)),
                auth_user(),
            ))
        }
    };
    Some(AuthEvent::Resolved { ticket, reply })
}

#[test]
fn test_auth_machine_user_present_iff_logged_in() {
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut machine = AuthMachine::default();
        let mut pending: Option<AuthEffect> = None;
        let mut late: Vec<AuthEffect> = Vec::new();
        let mut issued = 0;

        for _ in 0..STEPS {
            let roll = rng.gen_range(0..10);
            let event = if roll < 5 && pending.is_some() {
                let effect = pending.take().expect("pending checked");
                auth_answer(&mut rng, &effect, &mut issued)
            } else if roll == 5 && !late.is_empty() {
                let effect = late.remove(rng.gen_range(0..late.len()));
                auth_answer(&mut rng, &effect, &mut issued)
            } else {
                Some(auth_event(&mut rng))
            };
            let Some(event) = event else { continue };

            let step = machine.send(event);
            if let Some(effect) = step.effect {
                match effect {
                    AuthEffect::EndSession => {
                        assert_eq!(step.via, Some(AuthState::Logout));
                        // The call logout abandoned may still answer
                        if let Some(abandoned) = pending.take() {
                            late.push(abandoned);
                        }
                    }
                    effect => {
                        assert!(pending.is_none(), "second call issued while one is pending");
                        assert_eq!(machine.outstanding(), effect.ticket());
                        pending = Some(effect);
                    }
                }
            }

            let snapshot = machine.snapshot();
            assert_eq!(snapshot.current_user.is_some(), snapshot.state.is_logged_in());
            assert_eq!(snapshot.state.is_in_flight(), pending.is_some());
            assert_ne!(snapshot.state, AuthState::Logout);
        }
    }
}
