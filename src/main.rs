fn main() {
    dnablock_lib::run()
}
