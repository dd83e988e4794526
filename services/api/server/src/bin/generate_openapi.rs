#!/usr/bin/env cargo
use weight_api::openapi::WeightApiDoc;

fn main() {
    let openapi = WeightApiDoc::openapi();
    let json = serde_json::to_string_pretty(&openapi)
        .expect("Failed to serialize OpenAPI document to JSON");

    println!("{}", json);
}
