//! # Greeting Dispatcher 設定
//!
//! 環境変数から dispatcher の設定を読み込む。
//!
//! 解析は [`DispatcherConfig::from_lookup`] に集約し、環境変数を直接読むのは
//! [`DispatcherConfig::from_env`] だけにする。テストはプロセスの環境変数を
//! 書き換えずに任意の値を渡せる。
//!
//! 空文字列の変数は未設定として扱う。値が不正な場合は [`ConfigError`] を返し、
//! プロセスは非ゼロで終了する。

use std::{path::PathBuf, time::Duration};

use greetflow_domain::clock::CivilZone;
use greetflow_infra::notification::{SmtpSecurity, SmtpSettings};
use greetflow_shared::observability::LogFormat;

use crate::error::ConfigError;

/// dispatcher の設定
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// 名簿 CSV のパス
    pub roster_path:  PathBuf,
    /// テンプレートディレクトリ（未設定なら埋め込みテンプレート）
    pub template_dir: Option<PathBuf>,
    /// 「今日」を決めるタイムゾーン
    pub civil_zone:   CivilZone,
    pub ledger:       LedgerConfig,
    pub notification: NotificationConfig,
    pub delivery:     DeliveryConfig,
    pub log:          LogConfig,
}

/// 送信済み台帳の保存先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerBackend {
    Sqlite { database_url: String },
    Redis { redis_url: String },
}

/// 送信済み台帳の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub backend:        LedgerBackend,
    /// 保持日数（SQLite は起動時に削除、Redis は TTL）
    pub retention_days: u32,
}

/// 通知機能の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: SMTP サーバー経由で送信
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub enum NotificationConfig {
    Smtp(SmtpSettings),
    Noop,
}

/// 送信と再試行の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// 1 通あたりの最大試行回数（初回を含む）
    pub max_attempts:   u32,
    /// 最初の再試行までの待ち時間
    pub retry_interval: Duration,
    /// 同時に処理する記念日の数
    pub concurrency:    usize,
}

/// ログ出力の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// 日次ログファイルの出力先
    pub dir:    Option<PathBuf>,
}

/// SMTP プロバイダのプリセット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SmtpProvider {
    Gmail,
    Outlook,
    Custom,
}

const DEFAULT_SMTP_HOST: &str = "localhost";
const DEFAULT_SMTP_PORT: u16 = 1025;

impl DispatcherConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let civil_zone = CivilZone::new(
            vars.parse("CIVIL_UTC_OFFSET_MINUTES", 330)?,
            vars.get("CIVIL_ZONE_LABEL").unwrap_or_else(|| "IST".to_string()),
        )
        .map_err(|e| ConfigError::invalid("CIVIL_UTC_OFFSET_MINUTES", e.to_string()))?;

        Ok(Self {
            roster_path: vars.require("ROSTER_PATH")?.into(),
            template_dir: vars.get("TEMPLATE_DIR").map(PathBuf::from),
            civil_zone,
            ledger: LedgerConfig::from_vars(&vars)?,
            notification: NotificationConfig::from_vars(&vars)?,
            delivery: DeliveryConfig::from_vars(&vars)?,
            log: LogConfig::from_vars(&vars)?,
        })
    }
}

impl LedgerConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let backend = match vars.get("LEDGER_BACKEND").as_deref().unwrap_or("sqlite") {
            "sqlite" => LedgerBackend::Sqlite {
                database_url: vars
                    .get("LEDGER_DATABASE_URL")
                    .unwrap_or_else(|| "sqlite:greetflow-ledger.db".to_string()),
            },
            "redis" => LedgerBackend::Redis {
                redis_url: vars
                    .get("REDIS_URL")
                    .unwrap_or_else(|| "redis://localhost:6379".to_string()),
            },
            other => {
                return Err(ConfigError::invalid(
                    "LEDGER_BACKEND",
                    format!("sqlite または redis を指定してください: {other}"),
                ));
            }
        };

        Ok(Self {
            backend,
            retention_days: vars.parse_positive("LEDGER_RETENTION_DAYS", 7)?,
        })
    }
}

impl NotificationConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        match vars.get("NOTIFICATION_BACKEND").as_deref().unwrap_or("noop") {
            "noop" => Ok(Self::Noop),
            "smtp" => Ok(Self::Smtp(smtp_settings(vars)?)),
            other => Err(ConfigError::invalid(
                "NOTIFICATION_BACKEND",
                format!("smtp または noop を指定してください: {other}"),
            )),
        }
    }
}

fn smtp_settings(vars: &Vars<'_>) -> Result<SmtpSettings, ConfigError> {
    let provider = match vars.get("SMTP_PROVIDER").as_deref().unwrap_or("custom") {
        "gmail" => SmtpProvider::Gmail,
        "outlook" => SmtpProvider::Outlook,
        "custom" => SmtpProvider::Custom,
        other => {
            return Err(ConfigError::invalid(
                "SMTP_PROVIDER",
                format!("gmail, outlook, custom のいずれかを指定してください: {other}"),
            ));
        }
    };

    let (host, port, default_security) = match provider {
        SmtpProvider::Gmail => ("smtp.gmail.com".to_string(), 587, SmtpSecurity::StartTls),
        SmtpProvider::Outlook => ("smtp.office365.com".to_string(), 587, SmtpSecurity::StartTls),
        SmtpProvider::Custom => match vars.get("SMTP_HOST") {
            Some(host) => (
                host,
                vars.parse("SMTP_PORT", 587)?,
                SmtpSecurity::StartTls,
            ),
            None => (
                DEFAULT_SMTP_HOST.to_string(),
                vars.parse("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                SmtpSecurity::None,
            ),
        },
    };

    let security = match vars.get("SMTP_SECURITY").as_deref() {
        None => default_security,
        Some("starttls") => SmtpSecurity::StartTls,
        Some("tls") => SmtpSecurity::Tls,
        Some("none") => SmtpSecurity::None,
        Some(other) => {
            return Err(ConfigError::invalid(
                "SMTP_SECURITY",
                format!("starttls, tls, none のいずれかを指定してください: {other}"),
            ));
        }
    };

    let credentials = match (vars.get("SMTP_USERNAME"), vars.get("SMTP_PASSWORD")) {
        (Some(username), Some(password)) => Some((username, password)),
        (None, None) => None,
        _ => {
            return Err(ConfigError::invalid(
                "SMTP_USERNAME",
                "SMTP_USERNAME と SMTP_PASSWORD は両方指定してください",
            ));
        }
    };

    Ok(SmtpSettings {
        host,
        port,
        security,
        credentials,
        timeout: Duration::from_secs(vars.parse_positive("SMTP_TIMEOUT_SECS", 30)?),
        from_address: vars
            .get("NOTIFICATION_FROM_ADDRESS")
            .unwrap_or_else(|| "hr@greetflow.example.com".to_string()),
    })
}

impl DeliveryConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            max_attempts:   vars.parse_positive("DELIVERY_MAX_ATTEMPTS", 3)?,
            retry_interval: Duration::from_millis(vars.parse("DELIVERY_RETRY_INTERVAL_MS", 2000)?),
            concurrency:    vars.parse_positive("DISPATCH_CONCURRENCY", 4)?,
        })
    }
}

impl LogConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let format = match vars.get("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(value) => LogFormat::parse(&value).ok_or_else(|| {
                ConfigError::invalid(
                    "LOG_FORMAT",
                    format!("json または pretty を指定してください: {value}"),
                )
            })?,
        };

        Ok(Self {
            format,
            dir: vars.get("LOG_DIR").map(PathBuf::from),
        })
    }
}

/// 空文字列を未設定として扱う参照関数のラッパー
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::invalid(key, format!("{value}: {e}"))),
        }
    }

    fn parse_positive<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr + PartialOrd + Default,
        T::Err: std::fmt::Display,
    {
        let value = self.parse(key, default)?;
        if value <= T::default() {
            return Err(ConfigError::invalid(key, "1 以上を指定してください"));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<DispatcherConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DispatcherConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_名簿パスだけで既定値が入る() {
        let config = load(&[("ROSTER_PATH", "employees.csv")]).unwrap();

        assert_eq!(config.roster_path, PathBuf::from("employees.csv"));
        assert_eq!(config.template_dir, None);
        assert_eq!(config.civil_zone, CivilZone::ist());
        assert_eq!(
            config.ledger,
            LedgerConfig {
                backend:        LedgerBackend::Sqlite {
                    database_url: "sqlite:greetflow-ledger.db".to_string(),
                },
                retention_days: 7,
            }
        );
        assert!(matches!(config.notification, NotificationConfig::Noop));
        assert_eq!(
            config.delivery,
            DeliveryConfig {
                max_attempts:   3,
                retry_interval: Duration::from_secs(2),
                concurrency:    4,
            }
        );
        assert_eq!(
            config.log,
            LogConfig {
                format: LogFormat::Pretty,
                dir:    None,
            }
        );
    }

    #[test]
    fn test_名簿パスが未設定ならエラー() {
        let err = load(&[]).unwrap_err();

        assert!(matches!(err, ConfigError::Missing("ROSTER_PATH")));
    }

    #[test]
    fn test_空文字列は未設定として扱う() {
        let err = load(&[("ROSTER_PATH", "  ")]).unwrap_err();

        assert!(matches!(err, ConfigError::Missing("ROSTER_PATH")));
    }

    #[rstest]
    #[case("gmail", "smtp.gmail.com", 587, SmtpSecurity::StartTls)]
    #[case("outlook", "smtp.office365.com", 587, SmtpSecurity::StartTls)]
    #[case("custom", "localhost", 1025, SmtpSecurity::None)]
    fn test_smtpプロバイダのプリセット(
        #[case] provider: &str,
        #[case] host: &str,
        #[case] port: u16,
        #[case] security: SmtpSecurity,
    ) {
        let config = load(&[
            ("ROSTER_PATH", "employees.csv"),
            ("NOTIFICATION_BACKEND", "smtp"),
            ("SMTP_PROVIDER", provider),
        ])
        .unwrap();

        let NotificationConfig::Smtp(settings) = config.notification else {
            panic!("SMTP 設定であること");
        };
        assert_eq!(settings.host, host);
        assert_eq!(settings.port, port);
        assert_eq!(settings.security, security);
        assert_eq!(settings.credentials, None);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.from_address, "hr@greetflow.example.com");
    }

    #[test]
    fn test_customプロバイダはホスト指定でstarttlsになる() {
        let config = load(&[
            ("ROSTER_PATH", "employees.csv"),
            ("NOTIFICATION_BACKEND", "smtp"),
            ("SMTP_HOST", "mail.internal"),
            ("SMTP_USERNAME", "hr"),
            ("SMTP_PASSWORD", "secret"),
        ])
        .unwrap();

        let NotificationConfig::Smtp(settings) = config.notification else {
            panic!("SMTP 設定であること");
        };
        assert_eq!(settings.host, "mail.internal");
        assert_eq!(settings.port, 587);
        assert_eq!(settings.security, SmtpSecurity::StartTls);
        assert_eq!(
            settings.credentials,
            Some(("hr".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_redis台帳を選択できる() {
        let config = load(&[
            ("ROSTER_PATH", "employees.csv"),
            ("LEDGER_BACKEND", "redis"),
            ("REDIS_URL", "redis://cache:6379"),
            ("LEDGER_RETENTION_DAYS", "3"),
        ])
        .unwrap();

        assert_eq!(
            config.ledger,
            LedgerConfig {
                backend:        LedgerBackend::Redis {
                    redis_url: "redis://cache:6379".to_string(),
                },
                retention_days: 3,
            }
        );
    }

    #[test]
    fn test_civil_zoneを上書きできる() {
        let config = load(&[
            ("ROSTER_PATH", "employees.csv"),
            ("CIVIL_UTC_OFFSET_MINUTES", "-300"),
            ("CIVIL_ZONE_LABEL", "EST"),
        ])
        .unwrap();

        assert_eq!(config.civil_zone, CivilZone::new(-300, "EST").unwrap());
    }

    #[rstest]
    #[case("LEDGER_BACKEND", "postgres")]
    #[case("NOTIFICATION_BACKEND", "ses")]
    #[case("DELIVERY_MAX_ATTEMPTS", "0")]
    #[case("DELIVERY_MAX_ATTEMPTS", "three")]
    #[case("DISPATCH_CONCURRENCY", "0")]
    #[case("LEDGER_RETENTION_DAYS", "-1")]
    #[case("CIVIL_UTC_OFFSET_MINUTES", "5000")]
    #[case("LOG_FORMAT", "xml")]
    #[case("DELIVERY_RETRY_INTERVAL_MS", "soon")]
    fn test_不正な値は設定エラー(#[case] key: &str, #[case] value: &str) {
        let err = load(&[("ROSTER_PATH", "employees.csv"), (key, value)]).unwrap_err();

        assert!(
            matches!(&err, ConfigError::Invalid { key: k, .. } if *k == key),
            "{err}"
        );
    }

    #[test]
    fn test_smtp認証情報の片方だけはエラー() {
        let err = load(&[
            ("ROSTER_PATH", "employees.csv"),
            ("NOTIFICATION_BACKEND", "smtp"),
            ("SMTP_USERNAME", "hr"),
        ])
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "SMTP_USERNAME", .. }));
    }
}
