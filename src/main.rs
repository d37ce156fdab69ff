//! # Laudogen CLI
//!
//! Usage:
//!   laudogen generate inspection.json --template template.docx -o report.docx
//!   laudogen generate inspection.json --pdf -o report.pdf
//!   echo '{ ... }' | laudogen generate --pdf
//!   laudogen check-template template.docx
//!   laudogen describe-template
//!   laudogen init-template -o template.docx
//!   laudogen --example > inspection.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use laudogen::docx::{diagnose, fallback};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_inspection_json());
        return ExitCode::SUCCESS;
    }

    match args.get(1).map(String::as_str) {
        Some("generate") => cmd_generate(&args[2..]),
        Some("check-template") => cmd_check_template(&args[2..]),
        Some("describe-template") => {
            print!("{}", diagnose::describe_required_template());
            ExitCode::SUCCESS
        }
        Some("init-template") => cmd_init_template(&args[2..]),
        _ => {
            eprintln!("Usage: laudogen <generate|check-template|describe-template|init-template> [options]");
            eprintln!("       laudogen --example");
            ExitCode::FAILURE
        }
    }
}

fn cmd_generate(args: &[String]) -> ExitCode {
    let as_pdf = args.iter().any(|a| a == "--pdf");

    let input = match args.first().filter(|a| !a.starts_with('-')) {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("✗ Failed to read {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut buf = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buf) {
                eprintln!("✗ Failed to read stdin: {e}");
                return ExitCode::FAILURE;
            }
            buf
        }
    };

    let template = match flag_value(args, "--template") {
        Some(path) => match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                eprintln!("✗ Failed to read template {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None if as_pdf => None,
        // The DOCX path without --template uses the built-in layout.
        None => Some(fallback::build_minimal_template().to_bytes()),
    };

    let result = if as_pdf {
        laudogen::generate_pdf_json(&input)
    } else {
        laudogen::generate_docx_json(&input, template.as_deref())
    };

    match result {
        Ok(doc) => {
            let output_path = flag_value(args, "-o")
                .cloned()
                .unwrap_or_else(|| doc.suggested_filename.clone());
            if let Err(e) = fs::write(&output_path, &doc.bytes) {
                eprintln!("✗ Failed to write {output_path}: {e}");
                return ExitCode::FAILURE;
            }
            for warning in &doc.validation.warnings {
                eprintln!("! {warning}");
            }
            for event in doc.render_events.iter().filter(|e| e.is_degradation()) {
                eprintln!("! {event}");
            }
            eprintln!("✓ Written {} bytes to {output_path}", doc.bytes.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_check_template(args: &[String]) -> ExitCode {
    let Some(path) = args.first() else {
        eprintln!("Usage: laudogen check-template <template.docx>");
        return ExitCode::FAILURE;
    };
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("✗ Failed to read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = diagnose::check_template_integrity(&bytes);
    println!("{}", report.summary);
    for detail in &report.details {
        println!("  {detail}");
    }
    if report.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_init_template(args: &[String]) -> ExitCode {
    let output_path = flag_value(args, "-o")
        .cloned()
        .unwrap_or_else(|| "template.docx".to_string());
    let bytes = fallback::build_minimal_template().to_bytes();
    match fs::write(&output_path, &bytes) {
        Ok(()) => {
            eprintln!("✓ Written starter template to {output_path}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write {output_path}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| &w[1])
}

fn example_inspection_json() -> &'static str {
    r##"{
  "title": "Tower A Inspection",
  "kind": "Insalubrity survey",
  "address": "Industrial Ave 100",
  "unit": "Boiler house",
  "responsible": "Jane Doe",
  "surveyDate": "2024-03-01",
  "observations": "Routine annual survey.",
  "status": "completed",
  "participants": [
    {
      "name": "Jane Doe",
      "role": "Safety Engineer",
      "company": "Acme Engineering",
      "email": "jane@acme.example"
    },
    {
      "name": "John Smith",
      "role": "Plant Supervisor",
      "company": "Widget Industries",
      "email": ""
    }
  ],
  "photos": [],
  "nr15Assessments": [
    {
      "annexNumber": 1,
      "applies": true,
      "assessmentSite": "Boiler house, ground floor",
      "activitiesDescribed": "Boiler operation and maintenance rounds",
      "ppeUsed": "Ear muffs SNR 31 dB",
      "measurements": "Leq 91.2 dB(A) over 8h shift",
      "exposureTime": "8h daily",
      "conclusion": "Exposure above the tolerance limit; insalubrity at medium grade.",
      "observations": "",
      "agents": [
        {
          "agentId": "continuous-noise",
          "identified": true,
          "measuredValue": "91.2 dB(A)",
          "aboveLimit": true,
          "ppeDescription": "Ear muffs SNR 31 dB",
          "observations": ""
        }
      ]
    },
    {
      "annexNumber": 9,
      "applies": false,
      "assessmentSite": "",
      "activitiesDescribed": "",
      "ppeUsed": "",
      "measurements": "",
      "exposureTime": "",
      "conclusion": "",
      "observations": "",
      "agents": []
    }
  ],
  "nr15Observations": "Annexes 1 and 9 evaluated on site.",
  "sectorsEvaluated": "Boiler house, maintenance workshop",
  "activitiesDescription": "Continuous boiler operation with hourly inspection rounds.",
  "epcsIdentified": "Acoustic enclosure around feed pumps",
  "createdAt": "2024-02-20T09:00:00Z",
  "updatedAt": "2024-03-01T17:30:00Z"
}"##
}
