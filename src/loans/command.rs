pub mod create_loan_cmd;
pub mod return_loan_cmd;
