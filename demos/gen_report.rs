//! Generate an authenticity report for a small sample record

fn main() {
    let json = r#"{
        "base_time": 1705327200000,
        "events": [
            [0, "i", "src/main.py", 14],
            [1800, "i", "src/main.py", 9],
            [2600, "d", "src/main.py", 3],
            [5100, "i", "src/main.py", 22],
            [420000, "i", "src/util.py", 640],
            [421000, "s", "src/util.py", 0]
        ]
    }"#;

    match typescope::AnalysisProcessor::new().process(json) {
        Ok(report) => print!("{report}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
