//! Line-oriented command console over a [`DashboardSession`].
//!
//! Input lines and backend completions are handled on the same loop, so a
//! new command is read while earlier requests are still in flight. The
//! dashboard is printed whenever the session settles.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::latency;
use crate::presets::TrendView;
use crate::session::{DashboardSession, UserEvent};
use crate::types::{
    ALL_AGE_GROUPS, ALL_DISTRICTS, ALL_MONTHS, ALL_PINCODES, ALL_STATES, ALL_TYPES,
};
use crate::view::{render_text, DashboardView};

pub const HELP: &str = "\
Commands:
  state <name>|all       select a state
  district <name>|all    select a district
  pincode <code>|all     select a pincode
  year <yyyy>            set the year
  month <name>|all       set the month
  age <group>|all        set the age group
  type <kind>|all        set the enrolment type
  trend monthly|quarterly
  reset                  clear state, district and pincode
  show                   print the dashboard
  json                   print the dashboard as JSON
  latency                print request latency rollups
  quit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Event(UserEvent),
    Show,
    Json,
    Latency,
    Help,
    Quit,
}

/// `all` (any case) maps to the dimension's sentinel.
fn value_or(arg: &str, sentinel: &str) -> String {
    if arg.eq_ignore_ascii_case("all") {
        sentinel.to_string()
    } else {
        arg.to_string()
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let needs_arg = |name: &str| -> Result<(), String> {
        if arg.is_empty() {
            Err(format!("`{name}` needs a value"))
        } else {
            Ok(())
        }
    };

    let event = match verb.to_ascii_lowercase().as_str() {
        "state" => {
            needs_arg("state")?;
            UserEvent::SelectState(value_or(arg, ALL_STATES))
        }
        "district" => {
            needs_arg("district")?;
            UserEvent::SelectDistrict(value_or(arg, ALL_DISTRICTS))
        }
        "pincode" | "pin" => {
            needs_arg("pincode")?;
            UserEvent::SelectPincode(value_or(arg, ALL_PINCODES))
        }
        "year" => {
            needs_arg("year")?;
            UserEvent::SetYear(arg.to_string())
        }
        "month" => {
            needs_arg("month")?;
            UserEvent::SetMonth(value_or(arg, ALL_MONTHS))
        }
        "age" => {
            needs_arg("age")?;
            UserEvent::SetAgeGroup(value_or(arg, ALL_AGE_GROUPS))
        }
        "type" => {
            needs_arg("type")?;
            UserEvent::SetEnrolmentType(value_or(arg, ALL_TYPES))
        }
        "trend" => match TrendView::parse(arg) {
            Some(view) => UserEvent::SetTrendView(view),
            None => return Err("`trend` takes monthly or quarterly".to_string()),
        },
        "reset" => UserEvent::Reset,
        "show" | "" => return Ok(Command::Show),
        "json" => return Ok(Command::Json),
        "latency" => return Ok(Command::Latency),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        other => return Err(format!("Unknown command `{other}`. Type `help`.")),
    };
    Ok(Command::Event(event))
}

fn show<W: Write>(session: &DashboardSession, out: &mut W) -> std::io::Result<()> {
    write!(out, "{}", render_text(&DashboardView::compose(session)))?;
    out.flush()
}

fn write_json<W: Write, T: serde::Serialize>(value: &T, out: &mut W) -> std::io::Result<()> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => writeln!(out, "{json}")?,
        Err(e) => writeln!(out, "Failed to serialize: {e}")?,
    }
    out.flush()
}

/// Drive `session` from `input` until `quit` or end of input.
///
/// On end of input, outstanding requests are allowed to finish and the final
/// dashboard is printed. On `quit`, in-flight work is cancelled immediately.
pub async fn run<R, W>(
    session: &mut DashboardSession,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    show(session, out)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Command::Quit) => {
                        session.shutdown();
                        return Ok(());
                    }
                    Ok(Command::Help) => writeln!(out, "{HELP}")?,
                    Ok(Command::Latency) => write_json(&latency::get_rollups(), out)?,
                    Ok(Command::Json) => write_json(&DashboardView::compose(session), out)?,
                    Ok(Command::Show) => show(session, out)?,
                    Ok(Command::Event(event)) => {
                        session.dispatch(event);
                        if session.is_settled() {
                            show(session, out)?;
                        } else {
                            writeln!(out, "(waiting for backend)")?;
                            out.flush()?;
                        }
                    }
                    Err(msg) => writeln!(out, "{msg}")?,
                }
            }
            applied = session.next_completion(), if !session.is_settled() => {
                if applied && session.is_settled() {
                    show(session, out)?;
                }
            }
        }
    }

    if !session.is_settled() {
        session.settle().await;
        show(session, out)?;
    }
    session.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::backend::DashboardBackend;
    use crate::insight::InsightState;
    use crate::session::tests::FakeBackend;
    use crate::session::SessionOptions;

    fn session_with(fake: FakeBackend) -> (DashboardSession, Arc<FakeBackend>) {
        let fake = Arc::new(fake);
        let backend: Arc<dyn DashboardBackend> = fake.clone();
        (DashboardSession::new(backend, SessionOptions::default()), fake)
    }

    #[test]
    fn test_parse_names_with_spaces() {
        assert_eq!(
            parse_command("state Tamil Nadu").unwrap(),
            Command::Event(UserEvent::SelectState("Tamil Nadu".into()))
        );
        assert_eq!(
            parse_command("  district   Bengaluru Urban ").unwrap(),
            Command::Event(UserEvent::SelectDistrict("Bengaluru Urban".into()))
        );
    }

    #[test]
    fn test_parse_all_maps_to_sentinel() {
        assert_eq!(
            parse_command("pincode all").unwrap(),
            Command::Event(UserEvent::SelectPincode(ALL_PINCODES.into()))
        );
        assert_eq!(
            parse_command("month ALL").unwrap(),
            Command::Event(UserEvent::SetMonth(ALL_MONTHS.into()))
        );
    }

    #[test]
    fn test_parse_plain_commands() {
        assert_eq!(parse_command("reset").unwrap(), Command::Event(UserEvent::Reset));
        assert_eq!(
            parse_command("trend quarterly").unwrap(),
            Command::Event(UserEvent::SetTrendView(TrendView::Quarterly))
        );
        assert_eq!(parse_command("").unwrap(), Command::Show);
        assert_eq!(parse_command("QUIT").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("state").is_err());
        assert!(parse_command("trend weekly").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_pincode_is_read_while_previous_is_in_flight() {
        let mut fake = FakeBackend::india();
        fake.delays
            .insert("insight:411001".into(), Duration::from_secs(8));
        let (mut session, fake) = session_with(fake);

        let input: &[u8] = b"state Maharashtra\ndistrict Pune\npincode 411001\npincode 411002\n";
        let mut out = Vec::new();
        run(&mut session, input, &mut out).await.unwrap();

        assert!(!fake.completed().contains(&"insight:411001".to_string()));
        assert!(fake.completed().contains(&"insight:411002".to_string()));
        assert_eq!(session.selection().pincode, "411002");

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("(waiting for backend)"));
        assert!(text.contains("Recommendation for 411002:"));
        assert!(!text.contains("Recommendation for 411001:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_is_rendered_without_further_input() {
        let (mut session, _fake) = session_with(FakeBackend::india());
        let (mut writer, reader) = tokio::io::duplex(256);
        let reader = tokio::io::BufReader::new(reader);

        let feeder = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            writer.write_all(b"state Maharashtra\n").await.unwrap();
            // Keep the input open well past the backend latency.
            tokio::time::sleep(Duration::from_secs(30)).await;
            writer.write_all(b"quit\n").await.unwrap();
        });

        let mut out = Vec::new();
        run(&mut session, reader, &mut out).await.unwrap();
        feeder.await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let waiting = text.find("(waiting for backend)").unwrap();
        let rendered = text[waiting..].find("Viewing region: Maharashtra");
        assert!(rendered.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_cancels_in_flight_insight() {
        let mut fake = FakeBackend::india();
        fake.delays
            .insert("insight:411001".into(), Duration::from_secs(8));
        let (mut session, fake) = session_with(fake);

        let input: &[u8] = b"state Maharashtra\ndistrict Pune\npincode 411001\nquit\n";
        let mut out = Vec::new();
        run(&mut session, input, &mut out).await.unwrap();

        assert_eq!(session.insight().state(), &InsightState::Idle);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!fake.completed().contains(&"insight:411001".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_command_reports_and_continues() {
        let (mut session, _fake) = session_with(FakeBackend::india());
        let input: &[u8] = b"frobnicate\nmonth March\n";
        let mut out = Vec::new();
        run(&mut session, input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Unknown command `frobnicate`"));
        assert_eq!(session.selection().month, "March");
    }
}
