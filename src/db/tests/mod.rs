mod texts;
mod users;
