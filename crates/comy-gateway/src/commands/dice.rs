use rand::Rng;

use comy_core::error::Result;
use comy_core::param::Parameter;
use comy_core::protocol::CommandResult;

use crate::catalog::{Command, CommandInfos};

const DICES: &str = "Number of dices";
const MAX_DICES: i64 = 1000;
const DICE_IMAGE: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/a/a5/6sided_dice.jpg/800px-6sided_dice.jpg";

pub fn dices_simulator() -> Result<Command> {
    Command::sync("Dices simulator", roll)
        .image_url(DICE_IMAGE)
        .main_parameter(Parameter::int(DICES, 1))
        .build()
}

fn roll(infos: CommandInfos) -> CommandResult {
    let Some(n) = infos.params.get_int(DICES) else {
        return CommandResult::failure("Parameter missing");
    };
    if n <= 0 {
        return CommandResult::failure("Number of dices must be positive");
    }
    if n > MAX_DICES {
        return CommandResult::failure(format!("At most {MAX_DICES} dices"));
    }

    let mut rng = rand::thread_rng();
    let dices: Vec<String> = (0..n).map(|_| rng.gen_range(1..=6).to_string()).collect();
    let prefix = if n > 1 { "Dices are" } else { "Dice is" };
    CommandResult::success(format!("{prefix} {}", dices.join(" ")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use comy_core::param::Params;
    use serde_json::Value;

    use super::*;

    fn run(raw: &[(&str, &str)]) -> CommandResult {
        let cmd = dices_simulator().unwrap();
        let raw: HashMap<String, Value> = raw.iter().map(|(k, v)| (k.to_string(), Value::from(*v))).collect();
        let params = Params::coerce(cmd.parameters(), &raw).unwrap();
        roll(CommandInfos { caller: None, params })
    }

    #[test]
    fn rolls_requested_number_of_dices() {
        let one = run(&[(DICES, "1")]);
        assert!(one.is_success());
        assert!(one.message.starts_with("Dice is "));

        let three = run(&[(DICES, "3")]);
        let faces: Vec<i64> = three
            .message
            .trim_start_matches("Dices are ")
            .split(' ')
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(faces.len(), 3);
        assert!(faces.iter().all(|f| (1..=6).contains(f)));
    }

    #[test]
    fn rejects_missing_and_non_positive_counts() {
        assert_eq!(run(&[]).status.message, "Parameter missing");
        assert_eq!(run(&[(DICES, "0")]).status.message, "Number of dices must be positive");
        assert!(!run(&[(DICES, "5000")]).is_success());
    }
}
