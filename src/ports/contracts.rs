//! Contracts port (C13): reading source contracts from storage.

use crate::domain::Contract;
use crate::error::ContractError;

pub trait ContractsPort: Send + Sync {
    fn load_contracts(&self) -> Result<Vec<Contract>, ContractError>;
    fn get_contract(&self, key: &str) -> Result<Contract, ContractError>;
    fn all_keys(&self) -> Result<Vec<String>, ContractError>;
}
