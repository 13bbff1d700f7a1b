//! Human-readable instruction text from OSRM manoeuvres.

/// Build the instruction for one step.
pub fn instruction_text(
    maneuver_type: &str,
    modifier: Option<&str>,
    street: &str,
    exit: Option<u32>,
) -> String {
    let street = street.trim();
    let onto = |base: String| {
        if street.is_empty() {
            base
        } else {
            format!("{base} onto {street}")
        }
    };

    match maneuver_type {
        "depart" => {
            if street.is_empty() {
                "Start driving".to_string()
            } else {
                format!("Start on {street}")
            }
        }
        "arrive" => match modifier {
            Some("left") => "Your destination is on the left".to_string(),
            Some("right") => "Your destination is on the right".to_string(),
            _ => "Arrive at your destination".to_string(),
        },
        "roundabout" | "rotary" | "roundabout turn" => match exit {
            Some(n) => onto(format!("At the roundabout, take exit {n}")),
            None => onto("Enter the roundabout".to_string()),
        },
        "merge" => onto("Merge".to_string()),
        "on ramp" => onto("Take the ramp".to_string()),
        "off ramp" => onto("Take the exit".to_string()),
        "fork" => onto(fork_text(modifier).to_string()),
        "new name" | "continue" | "notification" => onto("Continue".to_string()),
        _ => onto(turn_text(modifier).to_string()),
    }
}

fn turn_text(modifier: Option<&str>) -> &'static str {
    match modifier {
        Some("uturn") => "Make a U-turn",
        Some("sharp right") => "Turn sharp right",
        Some("right") => "Turn right",
        Some("slight right") => "Keep slightly right",
        Some("slight left") => "Keep slightly left",
        Some("left") => "Turn left",
        Some("sharp left") => "Turn sharp left",
        _ => "Continue straight",
    }
}

fn fork_text(modifier: Option<&str>) -> &'static str {
    match modifier {
        Some(m) if m.contains("left") => "Keep left at the fork",
        Some(m) if m.contains("right") => "Keep right at the fork",
        _ => "Continue at the fork",
    }
}
