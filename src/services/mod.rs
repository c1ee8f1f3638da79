pub mod auth_service;
pub mod deduction_service;
pub mod employee_service;
pub mod employment_service;
pub mod message_service;
pub mod notification_service;
pub mod payroll_calculator;
pub mod payslip_renderer;
pub mod payslip_service;
