//! The sign-up conversation state machine.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::{FactoryStore, StoreError, UserStore};
use crate::types::{Priority, Role, User};

use super::session::{RegistrationSession, RegistrationStep, SessionStore, TempFields};

const YES_TOKENS: &[&str] = &["是", "好", "yes", "y"];
const NO_TOKENS: &[&str] = &["否", "不", "no", "n"];

const PRIORITY_PROMPT: &str =
    "請設定你在此廠區的優先級（輸入數字）：\n1. 第一優先（主要負責）\n2. 第二優先\n3. 第三優先";
const SECOND_CHOICE_PROMPT: &str = "是否要新增第二負責廠區？（是／否）";

/// What the router should do after feeding one input to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Conversation continues; send the contained prompt.
    InProgress(String),
    /// User record written; send the contained summary.
    Completed(String),
    /// A record for this user already existed; the session is cleared
    /// anyway and the contained notice should be sent.
    AlreadyRegistered(String),
}

impl RegistrationOutcome {
    pub fn reply(&self) -> &str {
        match self {
            Self::InProgress(text) | Self::Completed(text) | Self::AlreadyRegistered(text) => text,
        }
    }
}

/// Drives the registration conversation for all users.
///
/// The factory list shown at the factory-choice steps is re-read from the
/// store at prompt time, so admin mutations mid-conversation are picked up.
pub struct RegistrationFlow {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    factories: Arc<dyn FactoryStore>,
    roles: Vec<Role>,
}

impl RegistrationFlow {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        factories: Arc<dyn FactoryStore>,
        roles: Vec<Role>,
    ) -> Self {
        Self {
            sessions,
            users,
            factories,
            roles,
        }
    }

    /// Whether this user is mid-registration.
    pub async fn is_active(&self, user_id: &str) -> bool {
        self.sessions.get(user_id).await.is_some()
    }

    /// Begin the conversation, replacing any stale session.
    pub async fn start(&self, user_id: &str) -> String {
        self.sessions
            .put(user_id, RegistrationSession::default())
            .await;
        "開始註冊流程。\n請輸入你的姓名：".to_string()
    }

    /// Feed one message into the conversation. Invalid input re-sends the
    /// current step's prompt with an error prefix and mutates nothing.
    pub async fn handle(
        &self,
        user_id: &str,
        input: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        let Some(session) = self.sessions.get(user_id).await else {
            return Ok(RegistrationOutcome::InProgress(self.start(user_id).await));
        };
        let input = input.trim();

        match session.step {
            RegistrationStep::Name => self.on_name(user_id, session, input).await,
            RegistrationStep::Role => self.on_role(user_id, session, input).await,
            RegistrationStep::PrimaryFactory => {
                self.on_primary_factory(user_id, session, input).await
            }
            RegistrationStep::PrimaryPriority => {
                self.on_primary_priority(user_id, session, input).await
            }
            RegistrationStep::SecondFactoryChoice => {
                self.on_second_choice(user_id, session, input).await
            }
            RegistrationStep::SecondFactory => {
                self.on_second_factory(user_id, session, input).await
            }
            RegistrationStep::SecondPriority => {
                self.on_second_priority(user_id, session, input).await
            }
        }
    }

    async fn on_name(
        &self,
        user_id: &str,
        mut session: RegistrationSession,
        input: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        if input.is_empty() {
            return Ok(RegistrationOutcome::InProgress(
                "輸入錯誤，姓名不可為空。\n請輸入你的姓名：".to_string(),
            ));
        }

        session.temp.name = Some(input.to_string());
        session.step = RegistrationStep::Role;
        self.sessions.put(user_id, session).await;
        Ok(RegistrationOutcome::InProgress(self.role_prompt()))
    }

    async fn on_role(
        &self,
        user_id: &str,
        mut session: RegistrationSession,
        input: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        let Some(idx) = pick_index(input, self.roles.len()) else {
            return Ok(RegistrationOutcome::InProgress(format!(
                "輸入錯誤，請重新輸入角色的『數字』。\n{}",
                self.role_prompt()
            )));
        };

        session.temp.role = Some(self.roles[idx].clone());
        session.step = RegistrationStep::PrimaryFactory;
        self.sessions.put(user_id, session).await;

        let factories = self.factories.list_factories().await?;
        Ok(RegistrationOutcome::InProgress(numbered_prompt(
            "請選擇主要廠區（輸入數字）：",
            &factories,
        )))
    }

    async fn on_primary_factory(
        &self,
        user_id: &str,
        mut session: RegistrationSession,
        input: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        // Fresh read: the list may have changed since the prompt went out.
        let factories = self.factories.list_factories().await?;
        let Some(idx) = pick_index(input, factories.len()) else {
            return Ok(RegistrationOutcome::InProgress(format!(
                "輸入錯誤，請重新輸入廠區的『數字』。\n{}",
                numbered_prompt("請選擇主要廠區（輸入數字）：", &factories)
            )));
        };

        session.temp.primary_factory = Some(factories[idx].clone());
        session.step = RegistrationStep::PrimaryPriority;
        self.sessions.put(user_id, session).await;
        Ok(RegistrationOutcome::InProgress(PRIORITY_PROMPT.to_string()))
    }

    async fn on_primary_priority(
        &self,
        user_id: &str,
        mut session: RegistrationSession,
        input: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        let Some(priority) = parse_priority(input) else {
            return Ok(RegistrationOutcome::InProgress(format!(
                "請輸入 1、2 或 3 來設定優先級。\n{PRIORITY_PROMPT}"
            )));
        };

        session.temp.primary_priority = Some(priority);
        session.step = RegistrationStep::SecondFactoryChoice;
        self.sessions.put(user_id, session).await;
        Ok(RegistrationOutcome::InProgress(
            SECOND_CHOICE_PROMPT.to_string(),
        ))
    }

    async fn on_second_choice(
        &self,
        user_id: &str,
        mut session: RegistrationSession,
        input: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        let answer = input.to_lowercase();

        if NO_TOKENS.contains(&answer.as_str()) {
            return self.finalize(user_id, session.temp, None, "").await;
        }

        if YES_TOKENS.contains(&answer.as_str()) {
            let primary = session.temp.primary_factory.clone().unwrap_or_default();
            let options: Vec<String> = self
                .factories
                .list_factories()
                .await?
                .into_iter()
                .filter(|name| *name != primary)
                .collect();

            if options.is_empty() {
                return self
                    .finalize(user_id, session.temp, None, "目前沒有其他廠區可選。\n")
                    .await;
            }

            let prompt = numbered_prompt("請選擇第二廠區（輸入數字）：", &options);
            session.temp.options = options;
            session.step = RegistrationStep::SecondFactory;
            self.sessions.put(user_id, session).await;
            return Ok(RegistrationOutcome::InProgress(prompt));
        }

        Ok(RegistrationOutcome::InProgress(format!(
            "輸入錯誤，請回答「是」或「否」。\n{SECOND_CHOICE_PROMPT}"
        )))
    }

    async fn on_second_factory(
        &self,
        user_id: &str,
        mut session: RegistrationSession,
        input: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        // Index into the options snapshot taken when the prompt went out.
        let Some(idx) = pick_index(input, session.temp.options.len()) else {
            return Ok(RegistrationOutcome::InProgress(format!(
                "輸入錯誤，請重新輸入廠區的『數字』。\n{}",
                numbered_prompt("請選擇第二廠區（輸入數字）：", &session.temp.options)
            )));
        };

        session.temp.second_factory = Some(session.temp.options[idx].clone());
        session.step = RegistrationStep::SecondPriority;
        self.sessions.put(user_id, session).await;
        Ok(RegistrationOutcome::InProgress(
            "請設定你在第二廠區的優先級（輸入數字）：\n1. 第一優先（主要負責）\n2. 第二優先\n3. 第三優先"
                .to_string(),
        ))
    }

    async fn on_second_priority(
        &self,
        user_id: &str,
        session: RegistrationSession,
        input: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        let Some(priority) = parse_priority(input) else {
            return Ok(RegistrationOutcome::InProgress(
                "請輸入 1、2 或 3 來設定優先級。".to_string(),
            ));
        };

        let second = session.temp.second_factory.clone();
        match second {
            Some(factory) => {
                self.finalize(user_id, session.temp, Some((factory, priority)), "")
                    .await
            }
            None => {
                // Session state went inconsistent; abort the conversation.
                self.sessions.clear(user_id).await;
                Err(StoreError::Internal(
                    "second factory missing at final step".to_string(),
                ))
            }
        }
    }

    /// Write the user record and end the conversation. The session is
    /// cleared regardless of the store outcome.
    async fn finalize(
        &self,
        user_id: &str,
        temp: TempFields,
        second: Option<(String, Priority)>,
        notice: &str,
    ) -> Result<RegistrationOutcome, StoreError> {
        let (Some(name), Some(role), Some(primary), Some(primary_priority)) = (
            temp.name,
            temp.role,
            temp.primary_factory,
            temp.primary_priority,
        ) else {
            self.sessions.clear(user_id).await;
            return Err(StoreError::Internal(
                "registration temp fields incomplete".to_string(),
            ));
        };

        let mut factory_priority = BTreeMap::from([(primary.clone(), primary_priority)]);
        if let Some((factory, priority)) = &second {
            factory_priority.insert(factory.clone(), *priority);
        }

        let user = User {
            user_id: user_id.to_string(),
            name: name.clone(),
            factory_priority,
            role: role.clone(),
        };

        let inserted = self.users.add_user(user).await;
        self.sessions.clear(user_id).await;

        if !inserted? {
            tracing::info!(user_id = %user_id, "registration rejected: already registered");
            return Ok(RegistrationOutcome::AlreadyRegistered(
                "你已經註冊過了。".to_string(),
            ));
        }

        let mut summary = format!(
            "{notice}註冊完成！\n姓名：{name}\n角色：{}\n主要廠區：{primary}（{}）",
            role.label(),
            primary_priority.label()
        );
        if let Some((factory, priority)) = second {
            summary.push_str(&format!("\n第二廠區：{factory}（{}）", priority.label()));
        }

        tracing::info!(user_id = %user_id, "registration completed");
        Ok(RegistrationOutcome::Completed(summary))
    }

    fn role_prompt(&self) -> String {
        let lines: Vec<String> = self
            .roles
            .iter()
            .enumerate()
            .map(|(i, role)| format!("{}. {}", i + 1, role.label()))
            .collect();
        format!("請輸入你的角色（輸入數字）：\n{}", lines.join("\n"))
    }
}

/// Parse a 1-based menu choice against a list of the given length.
fn pick_index(input: &str, len: usize) -> Option<usize> {
    let choice: usize = input.parse().ok()?;
    (1..=len).contains(&choice).then(|| choice - 1)
}

fn parse_priority(input: &str) -> Option<Priority> {
    input.parse::<u8>().ok().and_then(Priority::new)
}

fn numbered_prompt(header: &str, items: &[String]) -> String {
    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect();
    format!("{header}\n{}", lines.join("\n"))
}
