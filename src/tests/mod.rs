mod adhash;
mod basic;
mod checked;
mod persistence;
mod pickling;
mod properties;
mod sharing;
mod weakref;
