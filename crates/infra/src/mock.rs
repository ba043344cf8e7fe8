//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! greetflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
   collections::{HashMap, VecDeque},
   sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greetflow_domain::{
   calendar::CanonicalDate,
   employee::EmployeeRow,
   event::{EventKey, EventKind},
   notification::{DeliveryError, EmailMessage},
};

use crate::{
   error::InfraError,
   notification::NotificationSender,
   repository::DispatchLedgerRepository,
   roster::RosterSource,
   template::{TemplateProvider, TemplateSource},
};

// ===== MockNotificationSender =====

/// 送信したメールを記録するモック
///
/// `push_result` で積んだ結果を先頭から順に返し、尽きたら成功を返す。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
   sent_emails: Arc<Mutex<Vec<EmailMessage>>>,
   attempts:    Arc<Mutex<Vec<String>>>,
   scripted:    Arc<Mutex<VecDeque<Result<(), DeliveryError>>>>,
   per_address: Arc<Mutex<HashMap<String, DeliveryError>>>,
}

impl MockNotificationSender {
   pub fn new() -> Self {
      Self::default()
   }

   /// 次の送信試行の結果を積む
   pub fn push_result(&self, result: Result<(), DeliveryError>) {
      self.scripted.lock().unwrap().push_back(result);
   }

   /// 指定した宛先への送信を常に失敗させる
   pub fn fail_address(&self, to: impl Into<String>, error: DeliveryError) {
      self.per_address.lock().unwrap().insert(to.into(), error);
   }

   /// 受理されたメール
   pub fn sent_emails(&self) -> Vec<EmailMessage> {
      self.sent_emails.lock().unwrap().clone()
   }

   /// 送信試行の回数（失敗を含む）
   pub fn attempt_count(&self) -> usize {
      self.attempts.lock().unwrap().len()
   }

   /// 送信を試行した宛先（試行順）
   pub fn attempted_addresses(&self) -> Vec<String> {
      self.attempts.lock().unwrap().clone()
   }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
   async fn send_email(&self, email: &EmailMessage) -> Result<(), DeliveryError> {
      self.attempts.lock().unwrap().push(email.to.clone());

      if let Some(error) = self.per_address.lock().unwrap().get(&email.to) {
         return Err(error.clone());
      }

      let result = self.scripted.lock().unwrap().pop_front().unwrap_or(Ok(()));
      if result.is_ok() {
         self.sent_emails.lock().unwrap().push(email.clone());
      }
      result
   }
}

// ===== MockDispatchLedgerRepository =====

#[derive(Clone, Default)]
pub struct MockDispatchLedgerRepository {
   entries:      Arc<Mutex<HashMap<EventKey, DateTime<Utc>>>>,
   commit_calls: Arc<Mutex<Vec<EventKey>>>,
   fail_reads:   Arc<Mutex<bool>>,
   fail_writes:  Arc<Mutex<bool>>,
}

impl MockDispatchLedgerRepository {
   pub fn new() -> Self {
      Self::default()
   }

   /// 記録済みのエントリを直接追加する
   pub fn insert(&self, key: EventKey, sent_at: DateTime<Utc>) {
      self.entries.lock().unwrap().insert(key, sent_at);
   }

   pub fn contains(&self, key: &EventKey) -> bool {
      self.entries.lock().unwrap().contains_key(key)
   }

   pub fn len(&self) -> usize {
      self.entries.lock().unwrap().len()
   }

   pub fn is_empty(&self) -> bool {
      self.len() == 0
   }

   /// `commit` が呼ばれたキー（重複を含む）
   pub fn commit_calls(&self) -> Vec<EventKey> {
      self.commit_calls.lock().unwrap().clone()
   }

   /// 以降の `is_committed` / `prune_before` をエラーにする
   pub fn fail_reads(&self) {
      *self.fail_reads.lock().unwrap() = true;
   }

   /// 以降の `commit` をエラーにする
   pub fn fail_writes(&self) {
      *self.fail_writes.lock().unwrap() = true;
   }
}

#[async_trait]
impl DispatchLedgerRepository for MockDispatchLedgerRepository {
   async fn is_committed(&self, key: &EventKey) -> Result<bool, InfraError> {
      if *self.fail_reads.lock().unwrap() {
         return Err(InfraError::unexpected("台帳の読み込みに失敗（モック）"));
      }
      Ok(self.contains(key))
   }

   async fn commit(&self, key: &EventKey, sent_at: DateTime<Utc>) -> Result<bool, InfraError> {
      self.commit_calls.lock().unwrap().push(key.clone());
      if *self.fail_writes.lock().unwrap() {
         return Err(InfraError::unexpected("台帳の書き込みに失敗（モック）"));
      }
      let mut entries = self.entries.lock().unwrap();
      if entries.contains_key(key) {
         return Ok(false);
      }
      entries.insert(key.clone(), sent_at);
      Ok(true)
   }

   async fn prune_before(&self, day: CanonicalDate) -> Result<u64, InfraError> {
      if *self.fail_reads.lock().unwrap() {
         return Err(InfraError::unexpected("台帳の削除に失敗（モック）"));
      }
      let mut entries = self.entries.lock().unwrap();
      let before = entries.len();
      entries.retain(|key, _| key.day >= day);
      Ok((before - entries.len()) as u64)
   }
}

// ===== MockRosterSource =====

#[derive(Clone, Default)]
pub struct MockRosterSource {
   rows:    Arc<Mutex<Vec<EmployeeRow>>>,
   failure: Arc<Mutex<Option<String>>>,
}

impl MockRosterSource {
   pub fn new(rows: Vec<EmployeeRow>) -> Self {
      Self {
         rows:    Arc::new(Mutex::new(rows)),
         failure: Arc::new(Mutex::new(None)),
      }
   }

   /// `load` を失敗させる
   pub fn failing(message: impl Into<String>) -> Self {
      Self {
         rows:    Arc::new(Mutex::new(Vec::new())),
         failure: Arc::new(Mutex::new(Some(message.into()))),
      }
   }
}

#[async_trait]
impl RosterSource for MockRosterSource {
   async fn load(&self) -> Result<Vec<EmployeeRow>, InfraError> {
      if let Some(message) = self.failure.lock().unwrap().clone() {
         return Err(InfraError::invalid_input(message));
      }
      Ok(self.rows.lock().unwrap().clone())
   }
}

// ===== MockTemplateProvider =====

/// 種別ごとのテンプレートを直接与えるプロバイダ
#[derive(Clone, Default)]
pub struct MockTemplateProvider {
   templates: HashMap<EventKind, TemplateSource>,
}

impl MockTemplateProvider {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn with(mut self, kind: EventKind, html: &str, text: Option<&str>) -> Self {
      self.templates.insert(
         kind,
         TemplateSource {
            html: html.to_string(),
            text: text.map(str::to_string),
         },
      );
      self
   }
}

impl TemplateProvider for MockTemplateProvider {
   fn template(&self, kind: EventKind) -> Option<&TemplateSource> {
      self.templates.get(&kind)
   }
}
