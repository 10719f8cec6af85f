#![allow(dead_code)]

pub mod components;
pub mod journal;
