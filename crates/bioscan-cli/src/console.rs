//! Line commands and their dispatch onto the service.

use bioscan_core::{DeviceTemplateId, RecordId, Template};
use bioscan_hardware::mock::{MockDriver, MockDriverHandle};
use bioscan_service::{BiometricService, CaptureResponse, MessageResponse, ServiceError};
use bioscan_storage::SqliteTemplateStore;
use serde::Serialize;
use serde_json::{Value, json};
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  status                          device status
  capture                         capture a fingerprint and store its template
  identify                        identify the finger on the sensor
  list                            list stored templates
  get <id>                        show one stored template
  delete <id>                     delete one stored template
  delete-all                      delete every stored template
  enroll <device-id>              capture and enroll on the device
  push <record-id> <device-id>    copy a stored template onto the device
  add <device-id> <template>      store a raw template on the device
  device-clear                    delete every template on the device
  finger <name> | lift            place a finger on, or lift it from, the simulated sensor
  help                            this text
  quit                            shut down";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },

    #[error("{0}")]
    InvalidArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Capture,
    Identify,
    List,
    Get(RecordId),
    Delete(RecordId),
    DeleteAll,
    Enroll(DeviceTemplateId),
    Push(RecordId, DeviceTemplateId),
    Add(DeviceTemplateId, Template),
    DeviceClear,
    Finger(String),
    Lift,
    Help,
    Quit,
}

fn one<'a>(
    args: &[&'a str],
    command: &'static str,
    expected: &'static str,
) -> Result<&'a str, CommandError> {
    match args {
        [arg] => Ok(*arg),
        _ => Err(CommandError::Usage { command, expected }),
    }
}

fn none(args: &[&str], command: &'static str) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::Usage {
            command,
            expected: "no arguments",
        })
    }
}

fn parse_arg<T: FromStr>(raw: &str) -> Result<T, CommandError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| CommandError::InvalidArgument(e.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_lowercase().as_str() {
            "status" => none(&args, "status").map(|_| Command::Status)?,
            "capture" => none(&args, "capture").map(|_| Command::Capture)?,
            "identify" => none(&args, "identify").map(|_| Command::Identify)?,
            "list" => none(&args, "list").map(|_| Command::List)?,
            "delete-all" => none(&args, "delete-all").map(|_| Command::DeleteAll)?,
            "device-clear" => none(&args, "device-clear").map(|_| Command::DeviceClear)?,
            "lift" => none(&args, "lift").map(|_| Command::Lift)?,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "get" => Command::Get(parse_arg(one(&args, "get", "<id>")?)?),
            "delete" => Command::Delete(parse_arg(one(&args, "delete", "<id>")?)?),
            "enroll" => Command::Enroll(parse_arg(one(&args, "enroll", "<device-id>")?)?),
            "finger" => Command::Finger(one(&args, "finger", "<name>")?.to_string()),
            "push" => match args.as_slice() {
                [record, device] => Command::Push(parse_arg(record)?, parse_arg(device)?),
                _ => {
                    return Err(CommandError::Usage {
                        command: "push",
                        expected: "<record-id> <device-id>",
                    });
                }
            },
            "add" => match args.as_slice() {
                [device, template] => Command::Add(parse_arg(device)?, parse_arg(template)?),
                _ => {
                    return Err(CommandError::Usage {
                        command: "add",
                        expected: "<device-id> <template>",
                    });
                }
            },
            _ => return Err(CommandError::Unknown(name.to_string())),
        };

        Ok(command)
    }
}

/// What the console should do after a command.
#[derive(Debug)]
pub enum Reply {
    Print(Value),
    Quit,
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| json!({ "message": "Failed to encode response", "error": e.to_string() }))
}

fn failure(context: &str, error: &ServiceError) -> Value {
    let status = if error.is_not_found() { 404 } else { 500 };
    let mut body = to_json(&MessageResponse::error(context, error));
    body["status"] = json!(status);
    body
}

pub struct Console {
    service: BiometricService<MockDriver, SqliteTemplateStore>,
    sensor: MockDriverHandle,
}

impl Console {
    pub fn new(
        service: BiometricService<MockDriver, SqliteTemplateStore>,
        sensor: MockDriverHandle,
    ) -> Self {
        Self { service, sensor }
    }

    pub fn service(&self) -> &BiometricService<MockDriver, SqliteTemplateStore> {
        &self.service
    }

    /// Parse and run one input line. Blank lines produce nothing.
    pub async fn handle_line(&self, line: &str) -> Option<Reply> {
        if line.trim().is_empty() {
            return None;
        }
        match line.parse::<Command>() {
            Ok(command) => Some(self.execute(command).await),
            Err(e) => Some(Reply::Print(
                to_json(&MessageResponse::error("Invalid command", e)),
            )),
        }
    }

    pub async fn execute(&self, command: Command) -> Reply {
        let body = match command {
            Command::Status => to_json(&self.service.get_status().await),
            Command::Capture => match self.service.capture().await {
                Ok(response) => to_json(&response),
                Err(e @ ServiceError::Driver { .. }) => {
                    let mut body = to_json(&CaptureResponse::failed(e.to_string()));
                    body["status"] = json!(500);
                    body
                }
                Err(e) => failure("Failed to capture fingerprint", &e),
            },
            Command::Identify => match self.service.identify().await {
                Ok(outcome) => to_json(&outcome),
                Err(e) => failure("Failed to identify fingerprint", &e),
            },
            Command::List => match self.service.list_templates().await {
                Ok(records) => to_json(&records),
                Err(e) => failure("Failed to list templates", &e),
            },
            Command::Get(id) => match self.service.get_template(id).await {
                Ok(record) => to_json(&record),
                Err(e) => failure(&format!("Failed to get template {id}"), &e),
            },
            Command::Delete(id) => match self.service.delete_template(id).await {
                Ok(()) => to_json(&MessageResponse::new(format!("Template {id} deleted"))),
                Err(e) => failure(&format!("Failed to delete template {id}"), &e),
            },
            Command::DeleteAll => match self.service.delete_all_templates().await {
                Ok(count) => to_json(&MessageResponse::new(format!(
                    "All templates deleted ({count} removed)"
                ))),
                Err(e) => failure("Failed to delete templates", &e),
            },
            Command::Enroll(id) => match self.service.enroll_on_device(id).await {
                Ok(enrolled) => json!({ "success": enrolled, "device_id": id }),
                Err(e) => failure("Failed to enroll on device", &e),
            },
            Command::Push(record_id, device_id) => {
                match self.service.push_record_to_device(record_id, device_id).await {
                    Ok(saved) => json!({
                        "success": saved,
                        "record_id": record_id,
                        "device_id": device_id,
                    }),
                    Err(e) => failure("Failed to push template to device", &e),
                }
            }
            Command::Add(id, template) => {
                match self.service.add_template_to_device(id, &template).await {
                    Ok(saved) => json!({ "success": saved, "device_id": id }),
                    Err(e) => failure("Failed to add template to device", &e),
                }
            }
            Command::DeviceClear => match self.service.delete_all_from_device().await {
                Ok(cleared) => json!({ "success": cleared }),
                Err(e) => failure("Failed to clear device", &e),
            },
            Command::Finger(name) => {
                self.sensor.place_finger(name.clone());
                to_json(&MessageResponse::new(format!("Finger '{name}' placed on sensor")))
            }
            Command::Lift => {
                self.sensor.lift_finger();
                to_json(&MessageResponse::new("Finger lifted from sensor"))
            }
            Command::Help => json!({ "message": HELP }),
            Command::Quit => return Reply::Quit,
        };
        Reply::Print(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioscan_hardware::DeviceSession;
    use bioscan_storage::Database;
    use rstest::rstest;

    #[rstest]
    #[case("status", Command::Status)]
    #[case("  CAPTURE ", Command::Capture)]
    #[case("list", Command::List)]
    #[case("get 3", Command::Get(RecordId::new(3)))]
    #[case("delete 12", Command::Delete(RecordId::new(12)))]
    #[case("delete-all", Command::DeleteAll)]
    #[case("enroll 4", Command::Enroll(DeviceTemplateId::new(4).unwrap()))]
    #[case("push 1 9", Command::Push(RecordId::new(1), DeviceTemplateId::new(9).unwrap()))]
    #[case("device-clear", Command::DeviceClear)]
    #[case("finger left-thumb", Command::Finger("left-thumb".to_string()))]
    #[case("exit", Command::Quit)]
    fn test_parse_command(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>().unwrap(), expected);
    }

    #[rstest]
    #[case("dance")]
    #[case("get")]
    #[case("get abc")]
    #[case("enroll 0")]
    #[case("push 1")]
    #[case("status now")]
    fn test_parse_command_rejects(#[case] line: &str) {
        assert!(line.parse::<Command>().is_err());
    }

    async fn console() -> Console {
        let db = Database::in_memory().await.unwrap();
        let (driver, sensor) = MockDriver::new();
        let service =
            BiometricService::new(DeviceSession::new(driver), SqliteTemplateStore::new(db.pool().clone()));
        service.initialize().await.unwrap();
        Console::new(service, sensor)
    }

    async fn print(console: &Console, line: &str) -> Value {
        match console.handle_line(line).await {
            Some(Reply::Print(value)) => value,
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_capture_then_get() {
        let console = console().await;

        let captured = print(&console, "capture").await;
        assert_eq!(captured["success"], true);
        assert_eq!(captured["biometric_id"], 1);

        let record = print(&console, "get 1").await;
        assert_eq!(record["id"], 1);
        assert_eq!(record["template"], captured["template"]);
    }

    #[tokio::test]
    async fn test_failed_capture_reports_message() {
        let console = console().await;
        print(&console, "capture").await;
        print(&console, "lift").await;

        let failed = print(&console, "capture").await;
        assert_eq!(failed["success"], false);
        assert_eq!(failed["status"], 500);
        assert!(
            failed["message"]
                .as_str()
                .unwrap()
                .starts_with("Failed to capture image")
        );
        assert_eq!(print(&console, "list").await, json!([]));
    }

    #[tokio::test]
    async fn test_missing_record_is_404() {
        let console = console().await;
        let body = print(&console, "delete 5").await;
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_blank_line_and_quit() {
        let console = console().await;
        assert!(console.handle_line("   ").await.is_none());
        assert!(matches!(console.handle_line("quit").await, Some(Reply::Quit)));
    }
}
