pub mod auth_dto;
pub mod deduction_dto;
pub mod employee_dto;
pub mod employment_dto;
pub mod message_dto;
pub mod payslip_dto;
