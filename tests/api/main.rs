mod birthday_campaign;
mod health_check;
mod users;
