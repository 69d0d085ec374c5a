use ethers::prelude::Abigen;
use std::{env, path::Path};

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();

    // gen types for FundMe.sol

    let abi_source = "../smart-contracts/abi/FundMe.json";
    println!("cargo:rerun-if-changed={abi_source}");
    let out_file = Path::new(&out_dir).join("fund_me_contract.rs");
    if out_file.exists() {
        std::fs::remove_file(&out_file).unwrap();
    }

    Abigen::new("FundMe", abi_source)
        .unwrap()
        .generate()
        .unwrap()
        .write_to_file(out_file)
        .unwrap();

    // gen types for the MockV3Aggregator price feed used on local networks

    let abi_source = "../smart-contracts/abi/MockV3Aggregator.json";
    println!("cargo:rerun-if-changed={abi_source}");
    let out_file = Path::new(&out_dir).join("mock_v3_aggregator_contract.rs");
    if out_file.exists() {
        std::fs::remove_file(&out_file).unwrap();
    }

    Abigen::new("MockV3Aggregator", abi_source)
        .unwrap()
        .generate()
        .unwrap()
        .write_to_file(out_file)
        .unwrap();
}
